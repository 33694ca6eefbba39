//! Follow-up discussion streaming over a completed analysis.

use tokio::sync::mpsc;
use uuid::Uuid;

use veritas_common::{util::as_percentage, Error, Result};
use veritas_core::{Message, MessageSender, StreamEvent};
use veritas_llm::{prompts, ChatTurn, LlmProvider};

use crate::orchestrator::Stores;

/// Stream one bot reply to a user's follow-up question.
///
/// Authorization and thread lookups run fail-closed before anything is
/// persisted. The reply streams as `content` events tagged with a
/// placeholder bot message that gets the full text once the stream ends.
pub(crate) async fn stream_reply(
    llm: &dyn LlmProvider,
    stores: &Stores,
    history_window: usize,
    temperature: f64,
    conversation_id: Uuid,
    claim_conversation_id: Uuid,
    user_id: Uuid,
    user_text: &str,
    events: &mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let conversation = stores
        .conversations
        .get(conversation_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("conversation {conversation_id} not found")))?;
    if conversation.user_id != user_id {
        return Err(Error::NotAuthorized(
            "conversation belongs to a different user".into(),
        ));
    }

    let claim_conversation = stores
        .conversations
        .get_claim_conversation(claim_conversation_id)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "claim conversation {claim_conversation_id} not found"
            ))
        })?;
    if claim_conversation.conversation_id != conversation_id {
        return Err(Error::NotAuthorized(
            "claim conversation belongs to a different conversation".into(),
        ));
    }

    let analysis = stores
        .analyses
        .latest_completed_for_claim(claim_conversation.claim_id)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "no completed analysis for claim {}",
                claim_conversation.claim_id
            ))
        })?;
    let claim = stores
        .claims
        .get(claim_conversation.claim_id)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("claim {} not found", claim_conversation.claim_id))
        })?;

    // The new user turn is persisted before the history window is read, so
    // it must be filtered back out of the fetched window below.
    let user_message = stores
        .messages
        .create(
            Message::new(conversation_id, MessageSender::User, user_text)
                .with_claim(claim.id)
                .with_claim_conversation(claim_conversation.id),
        )
        .await?;

    let mut history = stores
        .messages
        .recent_for_claim_conversation(claim_conversation.id, history_window + 1)
        .await?;
    history.retain(|m| m.id != user_message.id);
    if history.len() > history_window {
        let excess = history.len() - history_window;
        history.drain(..excess);
    }

    let confidence_pct = analysis
        .confidence_score
        .map_or_else(|| "unreported".to_string(), as_percentage);
    let mut transcript = vec![ChatTurn::system(prompts::discussion_system_prompt(
        &claim.claim_text,
        &analysis.analysis_text,
        &as_percentage(analysis.veracity_score),
        &confidence_pct,
    ))];
    for message in &history {
        transcript.push(match message.sender {
            MessageSender::User => ChatTurn::user(&message.content),
            MessageSender::Bot => ChatTurn::assistant(&message.content),
            MessageSender::System => ChatTurn::system(&message.content),
        });
    }
    transcript.push(ChatTurn::user(user_text));

    // Placeholder the chunks get tagged with; filled in after the stream.
    let placeholder = stores
        .messages
        .create(
            Message::new(conversation_id, MessageSender::Bot, "")
                .with_claim(claim.id)
                .with_analysis(analysis.id)
                .with_claim_conversation(claim_conversation.id),
        )
        .await?;

    let mut chunks = llm.generate_stream(&transcript, temperature).await?;
    let mut reply = String::new();
    while let Some(chunk) = chunks.recv().await {
        let chunk = chunk?;
        if chunk.is_complete {
            break;
        }
        reply.push_str(&chunk.text);
        let _ = events
            .send(StreamEvent::Content {
                content: chunk.text,
                message_id: Some(placeholder.id),
            })
            .await;
    }

    let mut persisted = placeholder;
    persisted.content = reply;
    let persisted = stores.messages.update(persisted).await?;
    tracing::info!(
        message_id = %persisted.id,
        claim_conversation_id = %claim_conversation.id,
        chars = persisted.content.len(),
        "discussion reply persisted"
    );

    let _ = events
        .send(StreamEvent::MessageComplete {
            message_id: persisted.id,
        })
        .await;
    Ok(())
}
