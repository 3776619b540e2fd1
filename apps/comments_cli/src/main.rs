use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use comment_core::{
    config::DEFAULT_SETTINGS_FILE, load_settings_from, CommentError, CommentEvent,
    CommentOperation, CommentsClient, NoticeLevel,
};
use shared::{
    domain::{AnswerId, CommentId, ParentRef, QuestionId},
    protocol::{Comment, CommentDraft, PageRequest, DEFAULT_PAGE},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qa-comments", about = "Read and manage comments on Q&A answers")]
struct Cli {
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Overrides the configured API base URL.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of comments on an answer.
    Answer {
        id: String,
        #[command(flatten)]
        page: PageOpts,
    },
    /// List one page of comments on a question.
    Question {
        id: String,
        #[command(flatten)]
        page: PageOpts,
    },
    Create {
        answer_id: String,
        body: String,
    },
    Delete {
        comment_id: String,
    },
}

#[derive(Args, Debug)]
struct PageOpts {
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u32,
    #[arg(long)]
    size: Option<u32>,
}

impl PageOpts {
    fn request(&self, default_size: u32) -> PageRequest {
        PageRequest::new(self.page, self.size.unwrap_or(default_size))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Cli::parse();

    let mut settings = load_settings_from(&args.config);
    if let Some(server_url) = args.server_url {
        settings.api_base_url = server_url;
    }
    debug!(
        api_base_url = %settings.api_base_url,
        page_size = settings.page_size,
        "comments: settings loaded"
    );
    let client = CommentsClient::new(&settings)?;
    let page_size = client.policy().page_size;

    let (event, parent) = match args.command {
        Command::Answer { id, page } => {
            let answer_id = AnswerId::new(id);
            let event = client
                .fetch_comments_for_answer(&answer_id, page.request(page_size))
                .await;
            (event, Some(ParentRef::Answer(answer_id)))
        }
        Command::Question { id, page } => {
            let question_id = QuestionId::new(id);
            let event = client
                .fetch_comments_for_question(&question_id, page.request(page_size))
                .await;
            (event, Some(ParentRef::Question(question_id)))
        }
        Command::Create { answer_id, body } => {
            let answer_id = AnswerId::new(answer_id);
            let event = match CommentDraft::new(body) {
                Ok(draft) => client.create_comment(&answer_id, &draft).await,
                Err(err) => {
                    client
                        .report_failure(CommentOperation::Draft, &CommentError::from(err))
                        .await
                }
            };
            (event, Some(ParentRef::Answer(answer_id)))
        }
        Command::Delete { comment_id } => {
            let comment_id = CommentId::new(comment_id);
            (client.delete_comment(&comment_id).await, None)
        }
    };

    print_notice(&event);
    if let Some(parent) = parent {
        let comments = match &parent {
            ParentRef::Answer(answer_id) => client.comments_for_answer(answer_id).await,
            ParentRef::Question(question_id) => client.comments_for_question(question_id).await,
        };
        for comment in &comments {
            println!("{}", render(comment));
        }
    }

    if let Some(failure) = client.last_error().await {
        bail!("{} failed: {}", failure.operation.name(), failure.message);
    }
    Ok(())
}

fn print_notice(event: &CommentEvent) {
    let notice = event.notice();
    match notice.level {
        NoticeLevel::Success => println!("{}", notice.text),
        NoticeLevel::Error => eprintln!("{}", notice.text),
    }
}

fn render(comment: &Comment) -> String {
    let author = comment.username.as_deref().unwrap_or("anonymous");
    match comment.created_at {
        Some(created_at) => format!(
            "[{}] {author} ({}): {}",
            comment.comment_id,
            created_at.format("%Y-%m-%d %H:%M"),
            comment.body
        ),
        None => format!("[{}] {author}: {}", comment.comment_id, comment.body),
    }
}
