use std::time::Duration;

use cell_framework::mock::{Probe, ProbeReceiver};
use cell_framework::{CellStatus, Environment, Event, Payload};
use chat_rooms::building::{add_building, add_room};
use chat_rooms::clients::{
    BuildingClient, CensorClient, PublicAddressClient, RoomClient, UserClient,
};
use chat_rooms::model::{user_id, FROM, MESSAGE, PUBLIC_ADDRESS_USER, TO, USER};
use chat_rooms::topics::{SAYS_ALL, SAYS_TO, USER_ADDED, USER_REMOVED};
use chat_rooms::user::{add_user, User};
use chat_rooms::ChatError;

const WAIT: Duration = Duration::from_millis(500);
const QUIET: Duration = Duration::from_millis(100);
const TIMEOUT: Duration = Duration::from_secs(1);

async fn school() -> Environment {
    let env = Environment::new();
    add_building(&env, "school", None).await.unwrap();
    add_room(
        &env,
        "school",
        "cafeteria",
        &["hell".to_string(), "badword".to_string()],
        TIMEOUT,
    )
    .await
    .unwrap();
    env
}

/// Starts a probe listening to everything `source` emits.
async fn listen(env: &Environment, source: &str) -> ProbeReceiver {
    let (probe, receiver) = Probe::new();
    let id = format!("probe:{source}");
    env.start_cell(id.as_str(), probe).await.unwrap();
    env.subscribe(source, &id).unwrap();
    receiver
}

async fn next_said(heard: &mut ProbeReceiver) -> Event {
    heard
        .next_topic(SAYS_ALL, WAIT)
        .await
        .expect("expected a says-all")
}

/// Next `says-all` sent by `from`, skipping notices and other speakers.
async fn next_said_by(heard: &mut ProbeReceiver, from: &str) -> Event {
    loop {
        let event = next_said(heard).await;
        if text(&event, FROM) == from {
            return event;
        }
    }
}

fn text<'a>(event: &'a Event, key: &str) -> &'a str {
    event.payload().get_str(key).unwrap_or_default()
}

#[tokio::test]
async fn test_user_message_reaches_the_room() {
    let env = school().await;
    let mut heard = listen(&env, "room:school:cafeteria").await;

    add_user(&env, "school", "cafeteria", "alice").await.unwrap();
    let joined = next_said(&mut heard).await;
    assert_eq!(text(&joined, MESSAGE), "user:alice has entered the room");
    assert_eq!(text(&joined, FROM), PUBLIC_ADDRESS_USER);

    let alice = UserClient::new(env.clone(), "alice", TIMEOUT);
    alice.say("school", "cafeteria", "hello").unwrap();

    let said = next_said(&mut heard).await;
    assert_eq!(text(&said, MESSAGE), "hello");
    assert_eq!(text(&said, FROM), "user:alice");
    assert_eq!(text(&said, "room"), "room:school:cafeteria");
}

#[tokio::test]
async fn test_censored_message_warns_privately() {
    let env = school().await;
    let mut heard = listen(&env, "room:school:cafeteria").await;
    add_user(&env, "school", "cafeteria", "alice").await.unwrap();
    next_said(&mut heard).await;

    let alice = UserClient::new(env.clone(), "alice", TIMEOUT);
    alice.say("school", "cafeteria", "what the hell").unwrap();

    let warning = heard
        .next(WAIT)
        .await
        .expect("expected a private warning");
    assert_eq!(warning.topic(), SAYS_TO);
    assert_eq!(text(&warning, TO), "user:alice");
    assert_eq!(text(&warning, FROM), "room:school:cafeteria:censor");
    assert_eq!(
        text(&warning, MESSAGE),
        "You can't say that! You've been warned 1 times."
    );
    assert!(heard.expect_silence(QUIET).await);

    let censor = CensorClient::new(env.clone(), "school", "cafeteria", TIMEOUT);
    assert_eq!(censor.warnings("alice").await.unwrap(), 1);

    alice.say("school", "cafeteria", "badword").unwrap();
    let warning = heard.next_topic(SAYS_TO, WAIT).await.unwrap();
    assert_eq!(
        text(&warning, MESSAGE),
        "You can't say that! You've been warned 2 times."
    );
    assert_eq!(censor.warnings("alice").await.unwrap(), 2);
}

#[tokio::test]
async fn test_clean_messages_do_not_count_as_warnings() {
    let env = school().await;
    add_user(&env, "school", "cafeteria", "bart").await.unwrap();
    let mut heard = listen(&env, "room:school:cafeteria").await;

    let bart = UserClient::new(env.clone(), "bart", TIMEOUT);
    bart.say("school", "cafeteria", "hello shell").unwrap();
    let said = next_said_by(&mut heard, "user:bart").await;
    assert_eq!(text(&said, MESSAGE), "hello shell");

    let censor = CensorClient::new(env.clone(), "school", "cafeteria", TIMEOUT);
    assert_eq!(censor.warnings("bart").await.unwrap(), 0);
    assert_eq!(censor.warnings("nobody").await.unwrap(), 0);
}

#[tokio::test]
async fn test_repeated_user_added_is_idempotent() {
    let env = school().await;
    let mut heard = listen(&env, "room:school:cafeteria").await;
    add_user(&env, "school", "cafeteria", "bart").await.unwrap();

    let again = Payload::new().apply([(USER, "user:bart")]);
    env.deliver_new("room:school:cafeteria", USER_ADDED, again)
        .unwrap();

    let room = RoomClient::new(env.clone(), "school", "cafeteria", TIMEOUT);
    assert_eq!(room.user_count().await.unwrap(), 1);
    next_said(&mut heard).await;
    assert!(heard.expect_silence(QUIET).await);
}

#[tokio::test]
async fn test_user_removed_announces_departure() {
    let env = school().await;
    let mut heard = listen(&env, "room:school:cafeteria").await;
    add_user(&env, "school", "cafeteria", "bart").await.unwrap();
    next_said(&mut heard).await;

    let leave = Payload::new().apply([(USER, "user:bart")]);
    env.deliver_new("room:school:cafeteria", USER_REMOVED, leave)
        .unwrap();

    let left = next_said(&mut heard).await;
    assert_eq!(text(&left, MESSAGE), "user:bart has left the room");
    let room = RoomClient::new(env.clone(), "school", "cafeteria", TIMEOUT);
    assert!(!room.in_room("bart").await.unwrap());
    assert_eq!(room.user_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_room_client_adds_users() {
    let env = school().await;
    let room = RoomClient::new(env.clone(), "school", "cafeteria", TIMEOUT);

    let id = room.add_user("Lisa Simpson").await.unwrap();
    assert_eq!(id, "user:lisa-simpson");
    assert!(room.in_room("lisa simpson").await.unwrap());

    let err = room.add_user("Lisa Simpson").await.unwrap_err();
    assert!(matches!(err, ChatError::Mesh(_)));
    assert_eq!(room.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_adding_to_unknown_room_fails() {
    let env = school().await;

    let err = add_user(&env, "school", "gym", "bart").await.unwrap_err();
    assert!(matches!(err, ChatError::RoomNotFound(id) if id == "room:school:gym"));
    assert!(!env.has_cell("user:bart"));

    let err = add_room(&env, "college", "gym", &[], TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::BuildingNotFound(_)));
}

#[tokio::test]
async fn test_public_address_name_is_reserved() {
    let env = school().await;

    let err = add_user(&env, "school", "cafeteria", "Public Address")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::ReservedName(_)));
    assert!(!env.has_cell(PUBLIC_ADDRESS_USER));
}

#[tokio::test]
async fn test_list_rooms_is_sorted() {
    let env = school().await;
    add_room(&env, "school", "auditorium", &[], TIMEOUT)
        .await
        .unwrap();

    let building = BuildingClient::new(env.clone(), "school", TIMEOUT);
    assert_eq!(
        building.list_rooms().await.unwrap(),
        vec!["room:school:auditorium", "room:school:cafeteria"]
    );
}

#[tokio::test]
async fn test_announcements_bypass_the_censor() {
    let env = school().await;
    let mut heard = listen(&env, "room:school:cafeteria").await;
    let mut hall = listen(&env, "building:school").await;

    let pa = PublicAddressClient::new(env.clone(), "school", TIMEOUT);
    let reached = pa.announce("hell week starts monday").await.unwrap();
    assert_eq!(reached, 2); // the building and the cafeteria

    let said = next_said(&mut heard).await;
    assert_eq!(text(&said, MESSAGE), "hell week starts monday");
    assert_eq!(text(&said, FROM), PUBLIC_ADDRESS_USER);
    let relayed = next_said(&mut hall).await;
    assert_eq!(text(&relayed, MESSAGE), "hell week starts monday");

    assert!(heard.expect_silence(QUIET).await);
}

#[tokio::test]
async fn test_building_ignores_untrusted_announcements() {
    let env = school().await;
    let mut hall = listen(&env, "building:school").await;

    let forged = Payload::new().apply([(FROM, "user:mallory"), (MESSAGE, "free pizza")]);
    env.deliver_new("building:school", SAYS_ALL, forged).unwrap();
    assert!(hall.expect_silence(QUIET).await);
    assert_eq!(env.status("building:school"), Some(CellStatus::Running));

    let genuine = Payload::new().apply([(FROM, PUBLIC_ADDRESS_USER), (MESSAGE, "fire drill")]);
    env.deliver_new("building:school", SAYS_ALL, genuine).unwrap();
    let relayed = next_said(&mut hall).await;
    assert_eq!(text(&relayed, MESSAGE), "fire drill");
}

#[tokio::test]
async fn test_outsiders_cannot_speak() {
    let env = school().await;
    let mut heard = listen(&env, "room:school:cafeteria").await;
    env.start_cell(user_id("carl"), User::new("carl"))
        .await
        .unwrap();

    let carl = UserClient::new(env.clone(), "carl", TIMEOUT);
    carl.say("school", "cafeteria", "let me in").unwrap();
    carl.say("school", "gym", "anyone?").unwrap();

    assert!(heard.expect_silence(QUIET * 2).await);
    assert_eq!(env.status("user:carl"), Some(CellStatus::Running));
}

#[tokio::test]
async fn test_users_are_subscribed_to_their_room() {
    let env = school().await;
    let mut heard = listen(&env, "room:school:cafeteria").await;
    add_user(&env, "school", "cafeteria", "alice").await.unwrap();
    add_user(&env, "school", "cafeteria", "bart").await.unwrap();

    let subscribers = env.subscribers("room:school:cafeteria").unwrap();
    assert!(subscribers.iter().any(|id| *id == "user:alice"));
    assert!(subscribers.iter().any(|id| *id == "user:bart"));

    let bart = UserClient::new(env.clone(), "bart", TIMEOUT);
    bart.say("school", "cafeteria", "hi alice").unwrap();
    let said = next_said_by(&mut heard, "user:bart").await;
    assert_eq!(text(&said, MESSAGE), "hi alice");
}

#[tokio::test]
async fn test_stopping_a_room_stops_its_censor() {
    let env = school().await;
    assert!(env.has_cell("room:school:cafeteria:censor"));

    env.stop_cell("room:school:cafeteria").await.unwrap();

    assert!(!env.has_cell("room:school:cafeteria"));
    assert!(!env.has_cell("room:school:cafeteria:censor"));
    let subscribers = env.subscribers("building:school:pa").unwrap();
    assert!(subscribers.iter().all(|id| *id != "room:school:cafeteria"));
}
