//! Example: batch extraction of tool directives from complete outputs.
//!
//! Run with: `cargo run --example batch_extract`

use llm_toolcall::{ExtractorConfig, Extractor, MultiBlockPolicy};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let outputs = [
        "I will check the weather first.\nAction: ```json\n[{\"tool_name\": \"weather\", \"parameters\": {\"city\": \"Oslo\"}}]\n```",
        "Two lookups. Action: ```json [{\"tool_name\": \"a\", \"parameters\": \"{\\\"id\\\": 1}\"}, {\"tool_name\": \"b\", \"parameters\": \"free text\"}] ```",
        "Broken directive. Action: ```json [ { broken ] ```",
        "Just chatting, no tools needed.",
    ];

    let extractor = Extractor::new();
    for output in outputs {
        let result = extractor.extract(output);
        println!("prose: {:?}", result.prose);
        println!("tools invoked: {}", result.tools_invoked);
        for call in result.to_tool_calls() {
            println!("  {}", serde_json::to_string(&call)?);
        }
        if !result.diagnostics.clean() {
            println!("  recovered: {:?}", result.diagnostics.recoveries);
        }
        println!();
    }

    // Repeated directives, merged instead of first-only
    let merging = Extractor::new()
        .with_config(ExtractorConfig::default().with_multi_block(MultiBlockPolicy::Merge));
    let result = merging.extract(
        "Action: ```json [{\"tool_name\": \"one\"}] ``` and Action: ```json [{\"tool_name\": \"two\"}] ```",
    );
    println!("merged calls: {:?}", result.calls);

    Ok(())
}
