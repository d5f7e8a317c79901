use std::path::{Path, PathBuf};

use rmcp::{
    ServiceExt,
    model::CallToolRequestParams,
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::json;

fn setup_fixture(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(
        data_dir.join("AAOIFI-Standards.txt"),
        "--- Page 1 ---\nRiba is any stipulated increase on a loan.\n\n\
         --- Page 2 ---\nGharar is excessive uncertainty in a contract.",
    )?;
    Ok(())
}

#[tokio::test]
async fn mcp_stdio_context_roundtrip() -> Result<(), Box<dyn std::error::Error>>
{
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;

    let bin = aaoifi_kb_bin();
    let transport = TokioChildProcess::new(
        tokio::process::Command::new(bin).configure(|cmd| {
            cmd.arg("mcp")
                .env("AAOIFI_KB_DATA_DIR", tempdir.path())
                .env("ENABLE_PDF_KNOWLEDGE", "true");
        }),
    )?;

    let client = ().serve(transport).await?;

    let args = json!({ "query": "gharar", "maxChars": 2000 });
    let result = client
        .peer()
        .call_tool(
            CallToolRequestParams::new("standards_context")
                .with_arguments(args.as_object().unwrap().clone()),
        )
        .await?;

    let structured = result.structured_content.expect("structured content");
    let context = structured
        .get("context")
        .and_then(|v| v.as_str())
        .expect("context string");
    assert!(context.starts_with("[AAOIFI Standards - Page 1]\n"));
    assert!(context.contains("excessive uncertainty"));

    let search_args = json!({ "query": "riba loan", "limit": 5 });
    let search_result = client
        .peer()
        .call_tool(
            CallToolRequestParams::new("standards_search")
                .with_arguments(search_args.as_object().unwrap().clone()),
        )
        .await?;

    let structured = search_result
        .structured_content
        .expect("structured content");
    let results = structured
        .get("results")
        .and_then(|v| v.as_array())
        .expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get("score").and_then(|v| v.as_u64()), Some(2));

    client.cancel().await?;
    Ok(())
}

fn aaoifi_kb_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_aaoifi-kb"))
}
