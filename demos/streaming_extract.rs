//! Example: incremental extraction while text is still being generated.
//!
//! Run with: `cargo run --example streaming_extract`

use futures::{stream, StreamExt};
use llm_toolcall::{stream_updates, Extractor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Simulated generation, split at awkward places
    let chunks = vec![
        "Let me look that ",
        "up for you. Act",
        "ion: ```json\n[{\"tool_name\": \"search\", ",
        "\"parameters\": {\"q\": \"rust streams\"}}, ",
        "{\"tool_name\": \"summarize\", \"parameters\": {}}",
        "]\n```",
    ];

    print_updates(&chunks).await?;

    // Looks like a directive until the array closes without a fence
    println!();
    print_updates(&["Use Action: ```json [1, ", "2] to list things."]).await?;

    Ok(())
}

async fn print_updates(chunks: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    let updates = stream_updates(
        Extractor::new(),
        stream::iter(chunks.iter().map(|c| c.to_string())),
    );
    futures::pin_mut!(updates);

    while let Some(update) = updates.next().await {
        let update = update?;
        if let Some(prose) = update.delta_prose {
            println!("[prose] {:?}", prose);
        }
        if update.calls_withdrawn {
            println!("[earlier calls withdrawn]");
        }
        for call in update.delta_calls {
            println!(
                "[call #{}] {} {}",
                call.index,
                call.name_delta.unwrap_or_default(),
                call.arguments_delta.unwrap_or_default()
            );
        }
        if !update.pending {
            println!("[no tool call pending]");
        }
    }

    Ok(())
}
