//! End-to-end pantry behaviour over the in-process adapters.
//!
//! Each test drives the public service API the way the CLI does and checks
//! both the product listings and the reminder queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use food_tracker::domain::ports::{FixtureFoodFactsSource, NotificationSink, ReminderQueue};
use food_tracker::domain::{
    NewProductRequest, PantryService, PantryServiceConfig, PantryServicePorts, Product,
    ProductId, ProductQuery, ReminderDispatcher, ReminderDispatcherConfig, ReminderExecutor,
};
use food_tracker::outbound::memory::{InMemoryProductRepository, InMemoryReminderQueue};
use food_tracker::test_support::{MutableClock, RecordingNotificationSink};
use futures_util::StreamExt;
use mockable::Clock;
use rstest::{fixture, rstest};

struct Pantry {
    clock: Arc<MutableClock>,
    queue: Arc<InMemoryReminderQueue>,
    service: PantryService,
}

impl Pantry {
    async fn pending_keys(&self) -> Vec<String> {
        self.queue
            .pending()
            .await
            .expect("pending reminders")
            .into_iter()
            .map(|entry| entry.key.as_str().to_owned())
            .collect()
    }

    async fn insert(&self, name: &str, quantity: i64, expiry: Option<&str>) -> Product {
        self.service
            .insert_product_at_home(NewProductRequest {
                id: None,
                name: name.to_owned(),
                quantity,
                expiry_date: expiry.map(str::to_owned),
            })
            .await
            .expect("insert succeeds")
            .expect("insert not ignored")
            .product
    }

    fn dispatcher(&self, sink: Arc<RecordingNotificationSink>) -> ReminderDispatcher {
        ReminderDispatcher::new(
            Arc::clone(&self.queue) as Arc<dyn ReminderQueue>,
            ReminderExecutor::new(sink as Arc<dyn NotificationSink>),
            Arc::clone(&self.clock) as Arc<dyn Clock>,
            ReminderDispatcherConfig::default(),
        )
    }
}

#[fixture]
fn pantry() -> Pantry {
    let clock = Arc::new(MutableClock::at_noon(2025, 6, 1));
    let queue = Arc::new(InMemoryReminderQueue::new(
        Arc::clone(&clock) as Arc<dyn Clock>
    ));
    let service = PantryService::new(
        PantryServicePorts {
            products: Arc::new(InMemoryProductRepository::new()),
            reminders: Arc::clone(&queue) as Arc<dyn ReminderQueue>,
            food_facts: Arc::new(FixtureFoodFactsSource),
        },
        Arc::clone(&clock) as Arc<dyn Clock>,
        PantryServiceConfig::default(),
    );
    Pantry {
        clock,
        queue,
        service,
    }
}

fn names(products: &[Product]) -> Vec<&str> {
    products
        .iter()
        .map(|product| product.name().as_str())
        .collect()
}

#[rstest]
#[tokio::test]
async fn inserted_product_is_at_home_with_two_reminders(pantry: Pantry) {
    let soda = pantry.insert("Soda", 3, Some("2025-06-30")).await;

    let stored = pantry
        .service
        .get_product(soda.id())
        .await
        .expect("lookup")
        .expect("stored");
    assert_eq!(stored, soda);
    assert_eq!(stored.quantity().get(), 3);
    assert_eq!(stored.expiry_date(), NaiveDate::from_ymd_opt(2025, 6, 30));
    assert!(!stored.in_cart());
    assert_eq!(names(&pantry.service.list_at_home().await.expect("home")), ["Soda"]);
    assert!(pantry.service.list_in_cart().await.expect("cart").is_empty());

    let id = soda.id();
    assert_eq!(
        pantry.pending_keys().await,
        [
            format!("one_week:{id}:Soda:2025-06-30"),
            format!("one_day:{id}:Soda:2025-06-30"),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn moving_to_cart_cancels_reminders_and_sorts_by_name(pantry: Pantry) {
    let soda = pantry.insert("Soda", 3, Some("2025-06-30")).await;
    let apples = pantry.insert("Apples", 6, Some("2025-06-12")).await;

    let moved = pantry
        .service
        .move_product_to_cart(soda.id())
        .await
        .expect("move soda");
    pantry
        .service
        .move_product_to_cart(apples.id())
        .await
        .expect("move apples");

    assert!(moved.product.in_cart());
    assert_eq!(moved.reminders.cancelled.len(), 2);
    assert!(pantry.pending_keys().await.is_empty());
    assert_eq!(
        names(&pantry.service.list_in_cart().await.expect("cart")),
        ["Apples", "Soda"]
    );
    assert!(pantry.service.list_at_home().await.expect("home").is_empty());
}

#[rstest]
#[tokio::test]
async fn removing_cancels_reminders_and_forgets_the_product(pantry: Pantry) {
    let soda = pantry.insert("Soda", 3, Some("2025-06-30")).await;

    let removed = pantry
        .service
        .remove_product(soda.id())
        .await
        .expect("remove");

    assert_eq!(removed.product, soda);
    assert!(pantry.pending_keys().await.is_empty());
    assert!(pantry.service.list_all().await.expect("all").is_empty());
    assert_eq!(
        pantry.service.get_product(soda.id()).await.expect("lookup"),
        None
    );
}

#[rstest]
#[tokio::test]
async fn product_without_expiry_schedules_nothing(pantry: Pantry) {
    let change = pantry
        .service
        .insert_product_at_home(NewProductRequest {
            id: None,
            name: "Rice".to_owned(),
            quantity: 1,
            expiry_date: None,
        })
        .await
        .expect("insert succeeds")
        .expect("insert not ignored");

    assert!(change.reminders.is_complete());
    assert!(change.reminders.scheduled.is_empty());
    assert!(pantry.pending_keys().await.is_empty());
    assert_eq!(change.product.expiry_date(), None);
}

#[rstest]
#[tokio::test]
async fn listings_partition_the_pantry(pantry: Pantry) {
    pantry.insert("Rice", 1, None).await;
    pantry.insert("Milk", 1, Some("2025-06-04")).await;
    let bread = pantry.insert("Bread", 1, Some("2025-06-02")).await;
    pantry.insert("Cheese", 1, Some("2025-07-10")).await;
    pantry
        .service
        .move_product_to_cart(bread.id())
        .await
        .expect("move bread");

    let all = pantry.service.list_all().await.expect("all");
    let home = pantry.service.list_at_home().await.expect("home");
    let cart = pantry.service.list_in_cart().await.expect("cart");

    assert_eq!(names(&all), ["Bread", "Milk", "Cheese", "Rice"]);
    assert_eq!(names(&home), ["Milk", "Cheese", "Rice"]);
    assert_eq!(names(&cart), ["Bread"]);

    let mut union: Vec<ProductId> = home.iter().chain(&cart).map(Product::id).collect();
    let mut expected: Vec<ProductId> = all.iter().map(Product::id).collect();
    union.sort();
    expected.sort();
    assert_eq!(union, expected);
}

#[rstest]
#[tokio::test]
async fn dispatcher_fires_reminders_when_they_fall_due(pantry: Pantry) {
    pantry.insert("Soda", 3, Some("2025-06-30")).await;
    let sink = Arc::new(RecordingNotificationSink::default());
    let dispatcher = pantry.dispatcher(Arc::clone(&sink));

    assert_eq!(dispatcher.run_once().await.expect("early poll"), 0);

    pantry.clock.advance_days(22);
    assert_eq!(dispatcher.run_once().await.expect("week poll"), 1);

    pantry.clock.advance(Duration::from_secs(6 * 24 * 60 * 60));
    assert_eq!(dispatcher.run_once().await.expect("day poll"), 1);

    let posted = sink.posted();
    let bodies: Vec<&str> = posted.iter().map(|note| note.body.as_str()).collect();
    assert_eq!(bodies, ["Expiring in 7 days", "Expiring in 1 day"]);
    assert!(posted.iter().all(|note| note.title == "You have 3 Soda left!"));
    assert!(pantry.pending_keys().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn late_insert_fires_immediately_with_actual_time_left(pantry: Pantry) {
    pantry.clock.advance_days(26);
    pantry.insert("Soda", 3, Some("2025-06-30")).await;
    let sink = Arc::new(RecordingNotificationSink::default());

    let fired = pantry
        .dispatcher(Arc::clone(&sink))
        .run_once()
        .await
        .expect("poll");

    assert_eq!(fired, 1);
    let posted = sink.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].body, "Expiring in 3 days");
    assert_eq!(pantry.pending_keys().await.len(), 1);
}

#[rstest]
#[tokio::test]
async fn live_listing_follows_mutations(pantry: Pantry) {
    let mut home = pantry.service.observe_list(ProductQuery::AtHome);

    let initial = home.next().await.expect("snapshot").expect("listing");
    assert!(initial.is_empty());

    let soda = pantry.insert("Soda", 3, Some("2025-06-30")).await;
    let after_insert = home.next().await.expect("update").expect("listing");
    assert_eq!(names(&after_insert), ["Soda"]);

    pantry
        .service
        .move_product_to_cart(soda.id())
        .await
        .expect("move");
    let after_move = home.next().await.expect("update").expect("listing");
    assert!(after_move.is_empty());
}
