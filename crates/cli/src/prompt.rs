use std::io::{self, BufRead, Write};

use {async_trait::async_trait, quotebridge_oauth::CodeSource};

/// Opens the authorization URL in a browser and reads the redirect URL (or
/// bare code) the operator pastes back on stdin.
pub struct BrowserPrompt {
    pub open_browser: bool,
}

#[async_trait]
impl CodeSource for BrowserPrompt {
    async fn authorization_input(&self, authorization_url: &str) -> io::Result<String> {
        if !self.open_browser || open::that(authorization_url).is_err() {
            println!("Open this URL in a browser to authorize:\n{authorization_url}");
        } else {
            println!("Opening browser for authorization...");
        }
        println!();
        println!("After approving, the browser lands on a page that may fail to load.");
        println!("Copy the full URL from the address bar and paste it here.");

        tokio::task::spawn_blocking(|| -> io::Result<String> {
            print!("Redirect URL: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await
        .map_err(io::Error::other)?
    }
}
