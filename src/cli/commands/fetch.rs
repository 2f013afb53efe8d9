//! Fetch command - send one request through the cache strategies
//!
//! The status line goes to stderr so the body can be piped from stdout.

use crate::cli::args::FetchArgs;
use crate::cli::Host;
use crate::error::{ShellError, ShellResult};
use crate::fetch::{FetchMode, Fetcher};
use crate::request::{Request, RequestMode};
use crate::worker::FetchOutcome;
use console::style;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Execute the fetch command
///
/// Requests the manager does not intercept are performed directly, the
/// way a browser would without a worker.
pub async fn execute(args: FetchArgs, host: &Host) -> ShellResult<()> {
    let manager = host.manager();
    let request = build_request(&args, &manager.config().origin)?;

    let (snapshot, source, revalidation) = match manager.handle_fetch(&request).await? {
        FetchOutcome::Passthrough => {
            let mode = passthrough_mode(&request, &manager.config().origin);
            let snapshot = host.fetcher().fetch(&request, mode).await?;
            (snapshot, "not intercepted".to_string(), None)
        }
        FetchOutcome::Respond {
            response,
            revalidation,
        } => (response.snapshot, response.source.to_string(), revalidation),
    };

    let status = if snapshot.is_success() {
        style(snapshot.status).green()
    } else {
        style(snapshot.status).yellow()
    };
    eprintln!(
        "{} {} {} ({} bytes)",
        status,
        request.key(),
        style(format!("[{}]", source)).cyan(),
        snapshot.body.len()
    );

    write_body(args.output.as_deref(), &snapshot.body).await?;

    // The process would otherwise exit before the refresh lands
    if let Some(revalidation) = revalidation {
        revalidation.finished().await;
    }

    Ok(())
}

async fn write_body(output: Option<&Path>, body: &[u8]) -> ShellResult<()> {
    match output {
        Some(path) => fs::write(path, body)
            .await
            .map_err(|e| ShellError::io(format!("writing {}", path.display()), e)),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(body)
                .await
                .map_err(|e| ShellError::io("writing response body", e))?;
            stdout
                .flush()
                .await
                .map_err(|e| ShellError::io("writing response body", e))
        }
    }
}

fn passthrough_mode(request: &Request, origin: &Url) -> FetchMode {
    if request.url.origin() == origin.origin() {
        FetchMode::SameOrigin
    } else {
        FetchMode::Cors
    }
}

fn build_request(args: &FetchArgs, origin: &Url) -> ShellResult<Request> {
    let url = Url::parse(&args.url).map_err(|e| ShellError::InvalidUrl {
        url: args.url.clone(),
        reason: e.to_string(),
    })?;

    if args.navigate {
        return Ok(Request::navigate(url));
    }

    let mode = if url.origin() == origin.origin() {
        RequestMode::SameOrigin
    } else {
        RequestMode::Cors
    };
    Ok(Request::new(&args.method, url, mode))
}
