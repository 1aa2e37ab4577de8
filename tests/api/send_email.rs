use crate::helpers::{fuel_settings, stub_service, Call, StubFactory, StubFuel, NEW_EMAIL_ID};
use exacttarget_mailer::domain::{EmailMessage, SubscriberEmail};
use exacttarget_mailer::fuel::{ObjectType, SubscriberRef};
use exacttarget_mailer::service::{ExactTargetService, ServiceError};
use serde_json::json;

fn recipients(addresses: &[&str]) -> Vec<SubscriberEmail> {
    addresses
        .iter()
        .map(|a| SubscriberEmail::parse(a.to_string()).unwrap())
        .collect()
}

fn message() -> EmailMessage {
    EmailMessage::new("Newsletter", "Plain text").with_alternative("<p>HTML</p>", "text/html")
}

#[tokio::test]
async fn message_is_delivered_to_every_recipient() {
    // arrange
    let factory = StubFactory::new(StubFuel::new(200));
    let service = stub_service(&factory);

    // act
    let sent = service
        .send_email(
            &recipients(&["a@x.com", "b@x.com"]),
            Some(&message()),
            None,
            None,
            true,
        )
        .await
        .unwrap();

    // assert
    assert!(sent);
    let fuel = &factory.fuel;
    assert_eq!(
        fuel.count(|c| matches!(c, Call::Post { object: ObjectType::Email, .. })),
        1
    );
    assert_eq!(
        fuel.count(|c| matches!(c, Call::Post { object: ObjectType::TriggeredSend, .. })),
        1
    );
    assert_eq!(
        fuel.count(|c| matches!(c, Call::Patch { object: ObjectType::TriggeredSend, .. })),
        1
    );
    assert_eq!(
        fuel.count(|c| matches!(c, Call::Get { object: ObjectType::Subscriber, .. })),
        2
    );
    let dispatches: Vec<_> = fuel
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Send { subscribers, .. } => Some(subscribers),
            _ => None,
        })
        .collect();
    assert_eq!(
        dispatches,
        vec![vec![
            SubscriberRef::new("a@x.com"),
            SubscriberRef::new("b@x.com")
        ]]
    );
}

#[tokio::test]
async fn triggered_send_links_classification_and_created_email() {
    let factory = StubFactory::new(StubFuel::new(200));
    let service = stub_service(&factory);

    service
        .send_email(&recipients(&["a@x.com"]), Some(&message()), None, None, true)
        .await
        .unwrap();

    let calls = factory.fuel.calls();
    let (definition, activation) = match (&calls[1], &calls[2]) {
        (
            Call::Post {
                object: ObjectType::TriggeredSend,
                props: definition,
            },
            Call::Patch {
                object: ObjectType::TriggeredSend,
                props: activation,
            },
        ) => (definition, activation),
        other => panic!("unexpected call sequence: {:?}", other),
    };
    assert_eq!(
        definition["SendClassification"],
        json!({ "CustomerKey": "classification" })
    );
    assert_eq!(
        definition["Email"],
        json!({ "ID": NEW_EMAIL_ID.to_string() })
    );
    assert_eq!(definition["CustomerKey"], definition["Name"]);
    assert_eq!(
        activation,
        &json!({
            "CustomerKey": definition["CustomerKey"].clone(),
            "TriggeredSendStatus": "Active",
        })
    );
    match calls.last() {
        Some(Call::Send { props, .. }) => {
            assert_eq!(props["CustomerKey"], definition["CustomerKey"])
        }
        other => panic!("expected a dispatch last, got {:?}", other),
    }
}

#[tokio::test]
async fn existing_email_id_skips_email_creation() {
    let factory = StubFactory::new(StubFuel::new(200));
    let service = stub_service(&factory);

    let sent = service
        .send_email(&recipients(&["a@x.com"]), None, Some("777"), None, true)
        .await
        .unwrap();

    assert!(sent);
    assert_eq!(
        factory
            .fuel
            .count(|c| matches!(c, Call::Post { object: ObjectType::Email, .. })),
        0
    );
    match &factory.fuel.calls()[0] {
        Call::Post { props, .. } => assert_eq!(props["Email"]["ID"], "777"),
        other => panic!("expected the triggered send first, got {:?}", other),
    }
}

#[tokio::test]
async fn message_or_email_id_is_required_before_any_remote_call() {
    let factory = StubFactory::new(StubFuel::new(200));
    let service = stub_service(&factory);

    let missing = service
        .send_email(&recipients(&["a@x.com"]), None, None, None, true)
        .await;
    let empty_id = service
        .send_email(&recipients(&["a@x.com"]), None, Some(""), None, false)
        .await;

    assert!(matches!(missing, Err(ServiceError::MissingArgument(_))));
    assert!(matches!(empty_id, Err(ServiceError::MissingArgument(_))));
    assert_eq!(factory.builds(), 0);
    assert!(factory.fuel.calls().is_empty());
}

#[tokio::test]
async fn missing_classification_key_is_a_configuration_error() {
    let factory = StubFactory::new(StubFuel::new(200));
    let mut settings = fuel_settings();
    settings.send_classification_key = None;
    let service = ExactTargetService::new(settings, false, factory.clone());

    let result = service
        .send_email(&recipients(&["a@x.com"]), Some(&message()), None, None, true)
        .await;

    assert!(matches!(result, Err(ServiceError::Configuration(_))));
    assert!(factory.fuel.calls().is_empty());
}

#[tokio::test]
async fn failed_dispatch_returns_false_when_failing_silently() {
    let factory = StubFactory::new(StubFuel::new(500));
    let service = stub_service(&factory);

    let sent = service
        .send_email(&recipients(&["a@x.com"]), Some(&message()), None, None, true)
        .await
        .unwrap();

    assert!(!sent);
}

#[tokio::test]
async fn failed_dispatch_is_reported_otherwise() {
    let factory = StubFactory::new(StubFuel::new(500));
    let service = stub_service(&factory);

    let result = service
        .send_email(&recipients(&["a@x.com"]), Some(&message()), None, None, false)
        .await;

    match result {
        Err(ServiceError::DispatchFailed { code, message }) => {
            assert_eq!(code, 500);
            assert_eq!(message, "stubbed dispatch");
        }
        other => panic!("expected a dispatch failure, got {:?}", other),
    }
}

#[tokio::test]
async fn dynamic_content_is_attached_to_every_recipient() {
    let factory = StubFactory::new(StubFuel::new(200).with_subscriber("b@x.com", "Active"));
    let service = stub_service(&factory);

    service
        .send_email(
            &recipients(&["a@x.com", "b@x.com"]),
            None,
            Some("777"),
            Some("<ctx/>"),
            true,
        )
        .await
        .unwrap();

    let writes: Vec<_> = factory
        .fuel
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Post {
                object: ObjectType::Subscriber,
                props,
            }
            | Call::Patch {
                object: ObjectType::Subscriber,
                props,
            } => Some(props["Attributes"].clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        writes,
        vec![json!([{ "Name": "XML", "Value": "<ctx/>" }]); 2]
    );
}

#[tokio::test]
async fn remote_failure_aborts_the_send_even_when_failing_silently() {
    // arrange
    let factory = StubFactory::new(StubFuel::new(200).failing_lookup_of("b@x.com"));
    let service = stub_service(&factory);

    // act
    let result = service
        .send_email(
            &recipients(&["a@x.com", "b@x.com"]),
            Some(&message()),
            None,
            None,
            true,
        )
        .await;

    // assert
    assert!(matches!(result, Err(ServiceError::Remote(_))));
    let fuel = &factory.fuel;
    assert_eq!(fuel.count(|c| matches!(c, Call::Send { .. })), 0);
    assert!(
        fuel.calls().contains(&Call::Post {
            object: ObjectType::Subscriber,
            props: json!({ "SubscriberKey": "a@x.com", "EmailAddress": "a@x.com" }),
        }),
        "the first recipient is created before the failure and kept"
    );
    assert!(matches!(
        fuel.calls().last(),
        Some(Call::Get { filter, .. }) if filter.value == "b@x.com"
    ));
}
