use clap::{Parser, Subcommand};
use screenshotapi::{CaptureParameters, ScreenshotApiError, ScreenshotClient, ScreenshotMetadata, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::AsyncWriteExt;

#[derive(Parser, Debug)]
#[command(
    name = "screenshotapi",
    about = "Capture web pages through the screenshotapi.net API",
    version
)]
pub struct Args {
    /// API token (overrides SCREENSHOTAPI_TOKEN and ~/.screenshotapi/settings.json)
    #[arg(long, short, global = true)]
    pub token: Option<String>,

    /// Log requests to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture a page and print where the screenshot is stored
    Url(CaptureArgs),

    /// Capture a page and write the image to stdout
    Image(CaptureArgs),

    /// Capture a page and save the image to a file
    Save {
        /// Destination file
        #[arg(long, short)]
        output: PathBuf,

        #[command(flatten)]
        capture: CaptureArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct CaptureArgs {
    /// Page to capture
    pub url: String,

    /// Browser width in pixels (server default 1680)
    #[arg(long)]
    pub width: Option<u32>,

    /// Browser height in pixels (server default 876)
    #[arg(long)]
    pub height: Option<u32>,

    /// Capture the entire page
    #[arg(long)]
    pub full_page: bool,

    /// Skip the server-side cache
    #[arg(long)]
    pub fresh: bool,

    /// Output image width; aspect ratio is kept
    #[arg(long)]
    pub thumbnail_width: Option<u32>,

    /// Milliseconds to wait before capturing
    #[arg(long)]
    pub delay: Option<u64>,

    /// Accept-Language header (server default "en-US,en;q=0.8")
    #[arg(long)]
    pub accept_languages: Option<String>,

    #[arg(long)]
    pub user_agent: Option<String>,

    /// Cache lifetime in seconds (server default 30 days)
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Stylesheet URL to inject
    #[arg(long)]
    pub css_url: Option<String>,

    /// Inline CSS to inject
    #[arg(long)]
    pub css: Option<String>,

    /// Capture only the element matching this selector
    #[arg(long)]
    pub selector: Option<String>,
}

impl From<CaptureArgs> for CaptureParameters {
    fn from(args: CaptureArgs) -> Self {
        // Unset flags are left to the server's defaults.
        CaptureParameters {
            url: args.url,
            width: args.width,
            height: args.height,
            full_page: args.full_page.then_some(true),
            fresh: args.fresh.then_some(true),
            thumbnail_width: args.thumbnail_width,
            delay: args.delay,
            accept_languages: args.accept_languages,
            user_agent: args.user_agent,
            ttl: args.ttl,
            css_url: args.css_url,
            css: args.css,
            selector: args.selector,
        }
    }
}

pub async fn run(args: Args) -> ExitCode {
    let client = match Settings::load().and_then(|s| s.with_token(args.token).client()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match execute(&client, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(client: &ScreenshotClient, command: Command) -> screenshotapi::Result<()> {
    match command {
        Command::Url(capture) => {
            let metadata = client.fetch_metadata(&capture.into()).await?;
            display_metadata(&metadata);
        }
        Command::Image(capture) => {
            let image = client.fetch_image(&capture.into()).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&image).await?;
            stdout.flush().await?;
        }
        Command::Save { output, capture } => {
            let task = client.save_to_file(&output, &capture.into()).await?;
            task.finished().await;
            println!("Saved to {}", output.display());
        }
    }
    Ok(())
}

fn display_metadata(metadata: &ScreenshotMetadata) {
    println!("Screenshot: {}", metadata.screenshot);
    println!("Page:       {}", metadata.url);
    println!(
        "Created:    {}",
        metadata
            .created_at_time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| metadata.created_at.clone())
    );
    println!(
        "Source:     {}",
        if metadata.is_fresh { "fresh capture" } else { "cache" }
    );
}

fn report_error(error: &ScreenshotApiError) {
    eprintln!("Error: {}", error.message());
    if let Some(status) = error.status() {
        eprintln!("  status:    {}", status);
    }
    if let Some(parameter) = error.parameter() {
        eprintln!("  parameter: {}", parameter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("screenshotapi").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn url_command_maps_only_given_flags() {
        let args = parse(&["url", "https://example.com", "--width", "800", "--full-page"]);

        let Command::Url(capture) = args.command else {
            panic!("expected url command");
        };
        let params = CaptureParameters::from(capture);
        assert_eq!(
            params,
            CaptureParameters {
                width: Some(800),
                full_page: Some(true),
                ..CaptureParameters::new("https://example.com")
            }
        );
    }

    #[test]
    fn save_command_requires_output() {
        let result = Args::try_parse_from(["screenshotapi", "save", "https://example.com"]);

        assert!(result.is_err());
    }

    #[test]
    fn global_token_is_accepted_after_subcommand() {
        let args = parse(&["save", "https://example.com", "-o", "shot.png", "--token", "abc123"]);

        assert_eq!(args.token.as_deref(), Some("abc123"));
        let Command::Save { output, capture } = args.command else {
            panic!("expected save command");
        };
        assert_eq!(output, PathBuf::from("shot.png"));
        assert_eq!(capture.url, "https://example.com");
    }

    #[test]
    fn image_command_passes_text_options_through() {
        let args = parse(&[
            "image",
            "https://example.com",
            "--selector",
            "#hero",
            "--css",
            "nav { display: none }",
            "--ttl",
            "60",
            "--fresh",
        ]);

        let Command::Image(capture) = args.command else {
            panic!("expected image command");
        };
        let params = CaptureParameters::from(capture);
        assert_eq!(params.selector.as_deref(), Some("#hero"));
        assert_eq!(params.css.as_deref(), Some("nav { display: none }"));
        assert_eq!(params.ttl, Some(60));
        assert_eq!(params.fresh, Some(true));
        assert_eq!(params.full_page, None);
    }
}
