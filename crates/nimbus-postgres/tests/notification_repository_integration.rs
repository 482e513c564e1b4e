#![cfg(feature = "integration-tests")]

use chrono::NaiveDate;
use nimbus_domain::{NewNotification, NewUser, NotificationRepository, UserRepository};
use nimbus_postgres::{PostgresClient, PostgresNotificationRepository, PostgresUserRepository};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

async fn client_for(container: &testcontainers::ContainerAsync<Postgres>) -> PostgresClient {
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("postgres port");
    let client = PostgresClient::new("127.0.0.1", port, "postgres", "postgres", "postgres", 5)
        .expect("postgres client");
    client.ping().await.expect("postgres ping");
    client.init_schema().await.expect("schema init");
    client
}

fn notification_at(minute: u32) -> NewNotification {
    NewNotification {
        city: "Athlone, IE".to_string(),
        condition: "rain".to_string(),
        temperature_celsius: 12.0,
        message: format!("alert #{minute}"),
        timestamp: NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(15, minute, 0)
            .unwrap(),
    }
}

#[tokio::test]
async fn insert_assigns_monotonic_ids() {
    let container = Postgres::default().start().await.expect("start postgres");
    let repository = PostgresNotificationRepository::new(client_for(&container).await);

    let first = repository.insert(notification_at(0)).await.unwrap();
    let second = repository.insert(notification_at(1)).await.unwrap();

    assert!(second.id > first.id);
    assert_eq!(first.city, "Athlone, IE");
}

#[tokio::test]
async fn list_recent_returns_newest_first() {
    let container = Postgres::default().start().await.expect("start postgres");
    let repository = PostgresNotificationRepository::new(client_for(&container).await);

    // 60 inserts in increasing timestamp order, 50 newest expected back
    for minute in 0..60 {
        repository.insert(notification_at(minute)).await.unwrap();
    }

    let recent = repository.list_recent(50).await.unwrap();
    assert_eq!(recent.len(), 50);

    for pair in recent.windows(2) {
        assert!(pair[0].timestamp > pair[1].timestamp);
    }
    assert_eq!(
        recent[0].timestamp,
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(15, 59, 0)
            .unwrap()
    );
}

#[tokio::test]
async fn user_seed_is_idempotent_and_queryable() {
    let container = Postgres::default().start().await.expect("start postgres");
    let repository = PostgresUserRepository::new(client_for(&container).await);

    let alice = NewUser {
        user_name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        city: "Athlone, IE".to_string(),
        notification_preference: "rain".to_string(),
    };

    let created = repository.create_user(alice.clone()).await.unwrap();
    assert!(created.is_some());

    let duplicate = repository.create_user(alice).await.unwrap();
    assert!(duplicate.is_none());

    let matches = repository
        .find_by_city_and_preference("Athlone, IE", "rain")
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].user_name, "Alice");

    let none = repository
        .find_by_city_and_preference("Athlone, IE", "clear")
        .await
        .unwrap();
    assert!(none.is_empty());
}
