use crate::application::agent::Conversation;
use crate::infrastructure::model::ModelProvider;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

const PROMPT: &str = "> ";

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interactive chat over line-oriented input. Returns on end of input or an
/// `exit`/`quit` line; a failed message is reported and the loop goes on.
pub async fn run<P, R, W>(
    conversation: &mut Conversation<P>,
    input: R,
    mut output: W,
) -> Result<(), StdioError>
where
    P: ModelProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.to_ascii_lowercase().as_str() {
            "exit" | "quit" => break,
            "/tools" => {
                write_tools(conversation, &mut output).await?;
                continue;
            }
            "/reset" => {
                conversation.reset();
                output.write_all(b"History cleared.\n").await?;
                continue;
            }
            _ => {}
        }

        debug!("Received STDIO line");
        match conversation.ask(line).await {
            Ok(answer) => {
                output.write_all(answer.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            Err(err) => {
                error!(%err, "Message processing failed via STDIO");
                let message = format!("Error: {}\n", err.user_message());
                output.write_all(message.as_bytes()).await?;
            }
        }
    }

    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

async fn write_tools<P, W>(conversation: &Conversation<P>, output: &mut W) -> Result<(), StdioError>
where
    P: ModelProvider,
    W: AsyncWrite + Unpin,
{
    let catalog = conversation.catalog();
    if catalog.is_empty() {
        output.write_all(b"No tools available.\n").await?;
        return Ok(());
    }
    for tool in catalog {
        let line = format!("- {}: {}\n", tool.name, tool.description);
        output.write_all(line.as_bytes()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::agent::ConversationOptions;
    use crate::domain::ChatMessage;
    use crate::infrastructure::model::{ModelError, ModelRequest, ModelResponse};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct EchoProvider {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ModelProvider for EchoProvider {
        async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            self.seen.lock().await.push(last.clone());
            if last == "fail" {
                return Err(ModelError::invalid_response("nope"));
            }
            Ok(ModelResponse::new(ChatMessage::assistant(format!("echo: {last}"))))
        }
    }

    async fn drive(input: &str) -> (String, Vec<String>) {
        let provider = EchoProvider::default();
        let mut conversation = Conversation::new(provider.clone(), ConversationOptions::new("m"));
        let mut output = Vec::new();
        run(&mut conversation, input.as_bytes(), &mut output)
            .await
            .expect("run");
        let seen = provider.seen.lock().await.clone();
        (String::from_utf8(output).expect("utf8"), seen)
    }

    #[tokio::test]
    async fn answers_each_line_and_skips_blanks() {
        let (output, seen) = drive("hello\n\n   \nworld\n").await;
        assert!(output.contains("echo: hello\n"));
        assert!(output.contains("echo: world\n"));
        assert_eq!(seen, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn exit_words_stop_the_loop() {
        let (_, seen) = drive("one\nQUIT\ntwo\n").await;
        assert_eq!(seen, vec!["one"]);
        let (_, seen) = drive("exit\ntwo\n").await;
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn errors_are_reported_and_loop_continues() {
        let (output, seen) = drive("fail\nafter\n").await;
        assert!(output.contains("Error: The model server sent a response that could not be processed."));
        assert!(output.contains("echo: after"));
        assert_eq!(seen, vec!["fail", "after"]);
    }

    #[tokio::test]
    async fn commands_are_not_sent_to_the_model() {
        let (output, seen) = drive("/tools\n/reset\n").await;
        assert!(output.contains("No tools available."));
        assert!(output.contains("History cleared."));
        assert!(seen.is_empty());
    }
}
