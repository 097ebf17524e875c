//! Fixtures of [`Service`] tests.

use std::time::Duration;

use common::{
    operations::{By, Insert, Select},
    DateTime, Money,
};

use crate::{
    domain::{
        product,
        sale::{self, item},
        Sale,
    },
    infra::{self, cache, Database as _},
    read, CatalogCacheConfig, Config, Service,
};

/// Secret the [`Session`] tokens of tests are signed with.
///
/// [`Session`]: crate::domain::user::Session
pub(crate) const JWT_SECRET: &[u8] = b"flash-sale-test-secret";

/// [`Service`] backed by in-memory infrastructure.
pub(crate) type TestService = Service<infra::Memory, cache::Memory>;

/// Creates a new [`TestService`] with empty storages.
pub(crate) fn service() -> TestService {
    Service::new(
        Config {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                JWT_SECRET,
            ),
            catalog_cache: CatalogCacheConfig::default(),
        },
        infra::Memory::new(),
        cache::Memory::new(),
    )
}

/// One hour.
pub(crate) const HOUR: Duration = Duration::from_secs(60 * 60);

/// Seeds a new catalog product priced at 100.00.
pub(crate) fn product(service: &TestService) -> product::Id {
    let id = product::Id::new();
    service.database().add_product(read::product::Product {
        id,
        name: format!("Product {id}"),
        price: Money::from_cents(10_000).unwrap(),
    });
    id
}

/// Seeds a new variant of the provided catalog product.
pub(crate) fn variant(
    service: &TestService,
    product_id: product::Id,
) -> product::VariantId {
    let id = product::VariantId::new();
    service.database().add_variant(read::product::Variant {
        id,
        product_id,
        name: format!("Variant {id}"),
    });
    id
}

/// Stores a new [`Sale`] with the provided time window, relative to now.
pub(crate) async fn sale(
    service: &TestService,
    starts_in: Option<Duration>,
    ends_in: Option<Duration>,
    is_active: bool,
) -> Sale {
    let now = DateTime::now();
    let start_time = starts_in.map_or(now - HOUR, |d| now + d);
    let end_time = ends_in.map_or(now + HOUR, |d| now + d);
    let sale = Sale {
        id: sale::Id::new(),
        name: sale::Name::new("Black Friday").unwrap(),
        start_time: start_time.coerce(),
        end_time: end_time.coerce(),
        is_active,
        created_at: now.coerce(),
    };
    service
        .database()
        .execute(Insert(sale.clone()))
        .await
        .unwrap();
    sale
}

/// Stores a new [`sale::Item`] of the provided [`Sale`].
pub(crate) async fn item(
    service: &TestService,
    sale_id: sale::Id,
    product_id: product::Id,
    variant_id: Option<product::VariantId>,
    price_cents: i64,
    max_quantity: i32,
) -> sale::Item {
    let item = sale::Item {
        id: item::Id::new(),
        sale_id,
        product_id,
        variant_id,
        price: Money::from_cents(price_cents).unwrap(),
        max_quantity: item::Quantity::new(max_quantity).unwrap(),
        sold_count: item::Quantity::ZERO,
        version: item::Version::INITIAL,
        created_at: DateTime::now().coerce(),
    };
    service
        .database()
        .execute(Insert(item.clone()))
        .await
        .unwrap();
    item
}

/// Stores a new [`sale::Item`] of a new product within a currently open
/// [`Sale`].
pub(crate) async fn open_item(
    service: &TestService,
    max_quantity: i32,
) -> sale::Item {
    let product_id = product(service);
    let sale = sale(service, None, None, true).await;
    item(service, sale.id, product_id, None, 5_000, max_quantity).await
}

/// Reads the stored state of the [`sale::Item`].
pub(crate) async fn stored_item(
    service: &TestService,
    id: item::Id,
) -> Option<sale::Item> {
    service
        .database()
        .execute(Select(By::<Option<sale::Item>, _>::new(id)))
        .await
        .unwrap()
}
