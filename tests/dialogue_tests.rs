use anyhow::Result;
use std::sync::Arc;
use teacher_marks_bot::database::{
    connection::DatabaseManager,
    store::{RecordCounts, RecordStore},
};
use teacher_marks_bot::dialogue::{DialogueController, DialogueStep, MarksState};
use teacher_marks_bot::utils::feedback::FeedbackType;
use teacher_marks_bot::utils::markdown::escape_markdown;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::ChatId;
use tempfile::TempDir;
use tokio_test::assert_ok;

const TEACHER_CHAT: ChatId = ChatId(1001);
const OTHER_CHAT: ChatId = ChatId(2002);
// Telegram rejects messages longer than this many characters.
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

async fn create_controller() -> Result<(DialogueController, RecordStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let db = DatabaseManager::new(&db_url).await?;
    db.run_migrations().await?;

    let storage: Arc<InMemStorage<MarksState>> = InMemStorage::new().into();
    let store = RecordStore::new(db);
    Ok((DialogueController::new(storage, store.clone()), store, temp_dir))
}

/// Sends every input in order and returns the step after the last one.
async fn send_all(controller: &DialogueController, chat_id: ChatId, inputs: &[&str]) -> Result<DialogueStep> {
    let mut step = DialogueStep::Idle;
    for input in inputs {
        let reply = controller
            .handle_text(chat_id, input)
            .await?
            .expect("session should be active");
        step = reply.step;
    }
    Ok(step)
}

#[tokio::test]
async fn test_begin_prompts_for_name() -> Result<()> {
    let (controller, _store, _temp_dir) = create_controller().await?;

    let reply = controller.begin(TEACHER_CHAT).await?;
    assert_eq!(reply.step, DialogueStep::AwaitingName);
    assert_eq!(reply.kind, FeedbackType::Prompt);
    assert!(reply.text.contains("name"));
    assert_eq!(controller.state(TEACHER_CHAT).await?, Some(MarksState::AwaitingName));
    Ok(())
}

#[tokio::test]
async fn test_prompts_follow_field_order() -> Result<()> {
    let (controller, _store, _temp_dir) = create_controller().await?;
    controller.begin(TEACHER_CHAT).await?;

    let expected = [
        ("Asha", DialogueStep::AwaitingSubject, "subject"),
        ("Math", DialogueStep::AwaitingTestType, "test type"),
        ("Midterm", DialogueStep::AwaitingPractical, "practical"),
        ("18", DialogueStep::AwaitingTheoretical, "theoretical"),
    ];
    for (input, step, prompt_word) in expected {
        let reply = controller.handle_text(TEACHER_CHAT, input).await?.expect("active session");
        assert_eq!(reply.step, step);
        assert!(reply.text.contains(prompt_word), "prompt {:?} should mention {}", reply.text, prompt_word);
    }
    Ok(())
}

#[tokio::test]
async fn test_full_dialogue_writes_one_student_and_one_mark() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    let step = send_all(&controller, TEACHER_CHAT, &["Asha", "Math", "Midterm", "18", "72"]).await?;

    assert_eq!(step, DialogueStep::Done);
    assert_eq!(controller.state(TEACHER_CHAT).await?, None);
    assert_eq!(store.counts().await?, RecordCounts { students: 1, marks: 1 });

    let report = store.export_all().await?;
    assert_eq!(report.rows[0].student_name, "Asha");
    assert_eq!(report.rows[0].practical_marks, 18);
    assert_eq!(report.rows[0].theoretical_marks, 72);
    Ok(())
}

#[tokio::test]
async fn test_confirmation_names_the_entry() -> Result<()> {
    let (controller, _store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &["Asha", "Math", "Midterm", "18"]).await?;
    let reply = controller.handle_text(TEACHER_CHAT, "72").await?.expect("active session");

    assert_eq!(reply.kind, FeedbackType::Success);
    assert!(reply.text.contains("Asha"));
    assert!(reply.text.contains("Math"));
    assert!(reply.text.contains("New student registered"));
    Ok(())
}

#[tokio::test]
async fn test_confirmation_for_long_fields_fits_one_message() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;
    let name = "A.".repeat(2000);
    let subject = "(Lab)".repeat(800);
    let test_type = "Mid-term!".repeat(450);

    controller.begin(TEACHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &[name.as_str(), subject.as_str(), test_type.as_str(), "18"]).await?;
    let reply = controller.handle_text(TEACHER_CHAT, "72").await?.expect("active session");

    assert_eq!(reply.step, DialogueStep::Done);
    let rendered = escape_markdown(&reply.kind.format(&reply.text));
    assert!(
        rendered.chars().count() <= TELEGRAM_MESSAGE_LIMIT,
        "confirmation is {} chars",
        rendered.chars().count()
    );

    // The stored values are not shortened
    let report = store.export_all().await?;
    assert_eq!(report.rows[0].student_name, name);
    assert_eq!(report.rows[0].subject, subject);
    assert_eq!(report.rows[0].test_type, test_type);
    Ok(())
}

#[tokio::test]
async fn test_rejected_long_score_fits_one_message() -> Result<()> {
    let (controller, _store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &["Asha", "Math", "Midterm"]).await?;
    let reply = controller
        .handle_text(TEACHER_CHAT, &"-.".repeat(2000))
        .await?
        .expect("active session");

    assert_eq!(reply.step, DialogueStep::AwaitingPractical);
    let rendered = escape_markdown(&reply.kind.format(&reply.text));
    assert!(rendered.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
    Ok(())
}

#[tokio::test]
async fn test_repeated_name_reuses_student() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &["Ravi", "Science", "Midterm", "15", "60"]).await?;
    controller.begin(TEACHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &["Ravi", "Science", "Final", "20", "65"]).await?;

    assert_eq!(store.counts().await?, RecordCounts { students: 1, marks: 2 });
    let report = store.export_all().await?;
    assert_eq!(report.rows[0].student_id, report.rows[1].student_id);
    Ok(())
}

#[tokio::test]
async fn test_cancel_at_every_step_leaves_no_rows() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;
    let inputs = ["Asha", "Math", "Midterm", "18"];

    for answered in 0..=inputs.len() {
        controller.begin(TEACHER_CHAT).await?;
        send_all(&controller, TEACHER_CHAT, &inputs[..answered]).await?;

        let reply = controller.cancel(TEACHER_CHAT).await?;
        assert_eq!(reply.step, DialogueStep::Cancelled);
        assert_eq!(controller.state(TEACHER_CHAT).await?, None);
        assert!(controller.handle_text(TEACHER_CHAT, "72").await?.is_none());
    }

    assert_eq!(store.counts().await?, RecordCounts { students: 0, marks: 0 });

    // A fresh session still works after cancelling
    controller.begin(TEACHER_CHAT).await?;
    let step = send_all(&controller, TEACHER_CHAT, &["Asha", "Math", "Midterm", "18", "72"]).await?;
    assert_eq!(step, DialogueStep::Done);
    Ok(())
}

#[tokio::test]
async fn test_cancel_without_session() -> Result<()> {
    let (controller, _store, _temp_dir) = create_controller().await?;

    let reply = controller.cancel(TEACHER_CHAT).await?;
    assert_eq!(reply.step, DialogueStep::Idle);
    assert!(reply.text.contains("/add_marks"));
    Ok(())
}

#[tokio::test]
async fn test_text_without_session_is_ignored() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;

    assert!(controller.handle_text(TEACHER_CHAT, "Asha").await?.is_none());
    assert_eq!(store.counts().await?, RecordCounts { students: 0, marks: 0 });
    Ok(())
}

#[tokio::test]
async fn test_invalid_score_reprompts_same_field() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &["Asha", "Math", "Midterm"]).await?;

    let reply = controller.handle_text(TEACHER_CHAT, "eighteen").await?.expect("active session");
    assert_eq!(reply.kind, FeedbackType::Error);
    assert_eq!(reply.step, DialogueStep::AwaitingPractical);
    assert!(reply.text.contains("whole number"));
    assert!(matches!(
        controller.state(TEACHER_CHAT).await?,
        Some(MarksState::AwaitingPractical { .. })
    ));

    // Recovering with a valid value continues normally
    let step = send_all(&controller, TEACHER_CHAT, &["18", "72"]).await?;
    assert_eq!(step, DialogueStep::Done);
    assert_eq!(store.counts().await?.marks, 1);
    Ok(())
}

#[tokio::test]
async fn test_blank_name_reprompts() -> Result<()> {
    let (controller, _store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    let reply = controller.handle_text(TEACHER_CHAT, "   ").await?.expect("active session");

    assert_eq!(reply.step, DialogueStep::AwaitingName);
    assert_eq!(controller.state(TEACHER_CHAT).await?, Some(MarksState::AwaitingName));
    Ok(())
}

#[tokio::test]
async fn test_begin_restarts_session_in_progress() -> Result<()> {
    let (controller, _store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &["Asha", "Math"]).await?;
    controller.begin(TEACHER_CHAT).await?;

    assert_eq!(controller.state(TEACHER_CHAT).await?, Some(MarksState::AwaitingName));
    Ok(())
}

#[tokio::test]
async fn test_conversations_do_not_share_scratch_state() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    controller.begin(OTHER_CHAT).await?;

    send_all(&controller, TEACHER_CHAT, &["Asha", "Math"]).await?;
    send_all(&controller, OTHER_CHAT, &["Ravi"]).await?;

    assert_eq!(
        controller.state(TEACHER_CHAT).await?,
        Some(MarksState::AwaitingTestType {
            student_name: "Asha".to_string(),
            subject: "Math".to_string(),
        })
    );
    assert_eq!(
        controller.state(OTHER_CHAT).await?,
        Some(MarksState::AwaitingSubject {
            student_name: "Ravi".to_string(),
        })
    );

    assert_ok!(controller.cancel(OTHER_CHAT).await);
    let step = send_all(&controller, TEACHER_CHAT, &["Final", "20", "65"]).await?;
    assert_eq!(step, DialogueStep::Done);

    let report = store.export_all().await?;
    assert_eq!(report.len(), 1);
    assert_eq!(report.rows[0].student_name, "Asha");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_conversations_same_new_student() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    controller.begin(OTHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &["Kiran", "Math", "Midterm", "10"]).await?;
    send_all(&controller, OTHER_CHAT, &["Kiran", "Physics", "Midterm", "12"]).await?;

    let (first, second) = tokio::join!(
        controller.handle_text(TEACHER_CHAT, "50"),
        controller.handle_text(OTHER_CHAT, "55"),
    );
    assert_eq!(first?.map(|r| r.step), Some(DialogueStep::Done));
    assert_eq!(second?.map(|r| r.step), Some(DialogueStep::Done));

    assert_eq!(store.counts().await?, RecordCounts { students: 1, marks: 2 });
    Ok(())
}

#[tokio::test]
async fn test_store_failure_aborts_dialogue_without_rows() -> Result<()> {
    let (controller, store, _temp_dir) = create_controller().await?;

    controller.begin(TEACHER_CHAT).await?;
    send_all(&controller, TEACHER_CHAT, &["Asha", "Math", "Midterm", "18"]).await?;

    // Break the marks table so the second statement of the commit fails
    sqlx::query("DROP TABLE marks")
        .execute(&store.database().pool)
        .await?;

    let reply = controller.handle_text(TEACHER_CHAT, "72").await?.expect("active session");
    assert_eq!(reply.kind, FeedbackType::Error);
    assert_eq!(reply.step, DialogueStep::Idle);
    assert_eq!(controller.state(TEACHER_CHAT).await?, None);

    let students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(&store.database().pool)
        .await?;
    assert_eq!(students, 0);
    Ok(())
}
