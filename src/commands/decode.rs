use anyhow::Result;

use crate::fastpath::FastPath;

/// Split a fast-path token into its parts and print them.
#[tracing::instrument]
pub fn decode(token: &str) -> Result<FastPath> {
    let fast_path = FastPath::decode(token)?;
    for line in describe(&fast_path) {
        println!("{}", line);
    }
    Ok(fast_path)
}

fn describe(fast_path: &FastPath) -> Vec<String> {
    vec![
        format!("source:   {}", fast_path.source),
        format!("package:  {}", fast_path.package),
        format!("version:  {}", fast_path.version),
        format!(
            "download: {}",
            fast_path.download_uri.as_deref().unwrap_or("-")
        ),
    ]
}
