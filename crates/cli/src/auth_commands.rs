use std::fmt::Write;

use {
    anyhow::Result,
    clap::Subcommand,
    quotebridge_config::load_credentials,
    quotebridge_oauth::{EnvTokenStorage, TokenStorage, parse_authorization_input},
};

use crate::{context::Context, prompt::BrowserPrompt};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Print the authorization URL and open it in a browser.
    Url {
        /// Only print the URL.
        #[arg(long)]
        no_browser: bool,
    },
    /// Authorize in the browser and paste the redirect URL back.
    Login {
        /// Print the URL instead of opening a browser.
        #[arg(long)]
        no_browser: bool,
    },
    /// Exchange a redirect URL or authorization code obtained elsewhere.
    Exchange {
        /// The full redirect URL, its query string, or the bare code.
        /// Prompted for when omitted.
        input: Option<String>,
    },
    /// Refresh the access token now.
    Refresh,
    /// Show credential and token status.
    Status,
}

pub async fn handle_auth(ctx: &Context, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Url { no_browser } => url(ctx, !no_browser),
        AuthAction::Login { no_browser } => login(ctx, !no_browser).await,
        AuthAction::Exchange { input } => exchange(ctx, input.as_deref()).await,
        AuthAction::Refresh => refresh(ctx).await,
        AuthAction::Status => status(ctx),
    }
}

fn url(ctx: &Context, open_browser: bool) -> Result<()> {
    let url = ctx.token_store()?.authorization_url();
    println!("{url}");
    if open_browser && open::that(&url).is_err() {
        eprintln!("Could not open browser; visit the URL above.");
    }
    Ok(())
}

async fn login(ctx: &Context, open_browser: bool) -> Result<()> {
    let store = ctx.token_store()?;
    let prompt = BrowserPrompt { open_browser };

    store.authorize(&prompt).await?;

    println!(
        "Authorized. Tokens saved to {}",
        ctx.env_file().path().display()
    );
    Ok(())
}

async fn exchange(ctx: &Context, input: Option<&str>) -> Result<()> {
    let store = ctx.token_store()?;
    match input {
        Some(input) => {
            let code = parse_authorization_input(input)?;
            println!("Exchanging code for tokens...");
            store.exchange_authorization_code(code).await?;
        },
        None => {
            store
                .authorize(&BrowserPrompt {
                    open_browser: false,
                })
                .await?;
        },
    }

    println!(
        "Authorized. Tokens saved to {}",
        ctx.env_file().path().display()
    );
    Ok(())
}

async fn refresh(ctx: &Context) -> Result<()> {
    let store = ctx.token_store()?;
    let pair = store.refresh().await?;
    match pair.expires_in {
        Some(secs) => println!("Access token refreshed (expires in {}m)", secs / 60),
        None => println!("Access token refreshed"),
    }
    Ok(())
}

fn status(ctx: &Context) -> Result<()> {
    print!("{}", status_report(ctx)?);
    Ok(())
}

fn status_report(ctx: &Context) -> Result<String> {
    let env_file = ctx.env_file();
    let mut out = String::new();
    writeln!(out, "env file:  {}", env_file.path().display())?;
    writeln!(out, "api:       {}", ctx.config().base_url())?;
    match load_credentials(&env_file) {
        Ok(credentials) => writeln!(out, "client id: {}", credentials.client_id_hint())?,
        Err(e) => writeln!(out, "client id: missing ({e})")?,
    }

    let tokens = EnvTokenStorage::new(env_file).load()?;
    writeln!(
        out,
        "tokens:    {}",
        if tokens.is_some() {
            "present"
        } else {
            "none (run `quotebridge auth login`)"
        }
    )?;
    Ok(out)
}
