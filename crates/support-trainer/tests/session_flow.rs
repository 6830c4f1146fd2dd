use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use support_trainer::llm::{Role, ScriptedCompletion};
use support_trainer::scoring::ResponseScorer;
use support_trainer::session::{
    ScenarioCatalog, Sender, SessionError, SessionRegistry, SessionState,
};

fn registry() -> SessionRegistry {
    SessionRegistry::new(
        Arc::new(ResponseScorer::standard()),
        ScenarioCatalog::standard(),
    )
}

#[tokio::test]
async fn two_turn_simulation_builds_transcript_and_prompt() {
    let registry = registry();
    let start = Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap();
    let view = registry
        .start(Some("delayed_delivery"), start)
        .expect("start simulation");
    assert_eq!(view.transcript.len(), 1);
    assert_eq!(view.transcript[0].sender, Sender::Customer);

    let completion = ScriptedCompletion::new([
        "Трек-номер у меня есть, но он не обновляется.",
        "Хорошо, жду ответа.",
    ]);

    let first = registry
        .respond(
            &view.session_id,
            "Извините за ожидание! Подскажите номер заказа, проверю статус доставки.",
            &completion,
            start + Duration::seconds(45),
        )
        .await
        .expect("first turn");
    assert_eq!(first.scores.empathy, 65.0);
    assert_eq!(first.scores.professionalism, 86.0);
    assert_eq!(first.scores.speed, 85.0);

    let second = registry
        .respond(
            &view.session_id,
            "Понимаю, передам в службу доставки.",
            &completion,
            start + Duration::minutes(4),
        )
        .await
        .expect("second turn");
    assert_eq!(second.scores.speed, 30.0);
    assert_eq!(
        second.customer_reply.map(|entry| entry.text),
        Some("Хорошо, жду ответа.".to_string())
    );

    let requests = completion.requests();
    assert_eq!(requests.len(), 2);
    let prompt = &requests[1].messages;
    assert_eq!(prompt[0].role, Role::System);
    let roles: Vec<Role> = prompt[1..].iter().map(|message| message.role).collect();
    assert_eq!(
        roles,
        vec![Role::Assistant, Role::User, Role::Assistant, Role::User]
    );

    let view = registry.view(&view.session_id).expect("view");
    assert_eq!(view.transcript.len(), 5);
    assert_eq!(view.state, SessionState::AwaitingUserInput);
    let ids: Vec<u32> = view.transcript.iter().map(|entry| entry.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn blank_message_is_rejected_without_calling_completion() {
    let registry = registry();
    let view = registry.start(None, Utc::now()).expect("start");
    let completion = ScriptedCompletion::new(["не должно понадобиться"]);

    let error = registry
        .respond(&view.session_id, "   ", &completion, Utc::now())
        .await
        .expect_err("blank message");
    assert!(matches!(error, SessionError::EmptyMessage));
    assert!(completion.requests().is_empty());
    assert_eq!(
        registry.view(&view.session_id).expect("view").latest_scores,
        None
    );
}

#[tokio::test]
async fn sessions_are_isolated() {
    let registry = registry();
    let now = Utc::now();
    let first = registry.start(Some("refund_request"), now).expect("first");
    let second = registry.start(Some("damaged_product"), now).expect("second");
    let completion = ScriptedCompletion::new(["Ок"]);

    registry
        .respond(&first.session_id, "Оформим возврат сегодня", &completion, now)
        .await
        .expect("turn");

    assert_eq!(
        registry.view(&first.session_id).expect("first").transcript.len(),
        3
    );
    assert_eq!(
        registry.view(&second.session_id).expect("second").transcript.len(),
        1
    );
}
