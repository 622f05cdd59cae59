use clap::{Parser, Subcommand};
use recipe_client::api::{ApiClient, ReqwestTransport};
use recipe_client::auth::{
    CookieCredentialResolver, RemoteSessionProvider, SessionProvider, cookie,
};
use recipe_client::config::{self, ClientConfig};
use recipe_client::imaging::{
    CompressParams, DEFAULT_UPLOAD_ENDPOINT, ImageUpload, RustBackend, SourceImage, compress,
};
use recipe_client::{output, validation};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recipe-client")]
#[command(about = "Command-line client for the recipe API")]
#[command(long_about = "\
Command-line client for the recipe API

Compresses images the way uploads are compressed, inspects session cookies,
and issues authenticated requests. Requests carry the access token from the
session cookie and retry once after a refresh when the server answers 401.

Cookies are passed as a raw header value, e.g.:

  --cookie 'sb-access-token=base64-eyJhY2Nlc3NfdG9rZW4iOi4uLn0='

Set RUST_LOG=debug for request and compression tracing on stderr.

Run 'recipe-client gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for the configured compression envelope.
#[derive(clap::Args, Clone)]
struct CompressArgs {
    /// Image to compress
    input: PathBuf,
    /// Output file (defaults to `<input>-compressed.<ext>`)
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long)]
    max_width: Option<u32>,
    #[arg(long)]
    max_height: Option<u32>,
    /// Byte budget in KiB
    #[arg(long)]
    target_kb: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Compress an image into the upload envelope
    Compress(CompressArgs),
    /// Compress an image and upload it
    Upload {
        /// Image to upload
        input: PathBuf,
        /// Raw `Cookie` header carrying the session
        #[arg(long)]
        cookie: String,
        #[arg(long, default_value = DEFAULT_UPLOAD_ENDPOINT)]
        endpoint: String,
    },
    /// Decode the access token from a session cookie
    Token {
        /// Raw `Cookie` header carrying the session
        #[arg(long)]
        cookie: String,
    },
    /// Issue an authenticated GET and print the JSON response
    Get {
        /// API path, resolved against `api_base`
        path: String,
        /// Raw `Cookie` header carrying the session
        #[arg(long)]
        cookie: Option<String>,
    },
    /// List ingredient units and their ids
    Units,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compress(args) => {
            let mut config = config::load_config(cli.config.as_deref())?;
            let images = &mut config.images;
            images.max_width = args.max_width.unwrap_or(images.max_width);
            images.max_height = args.max_height.unwrap_or(images.max_height);
            images.target_size_kb = args.target_kb.unwrap_or(images.target_size_kb);
            config.validate()?;
            let params = CompressParams::from(&config.images);

            let bytes = std::fs::read(&args.input)?;
            let source_size = bytes.len();
            let image = compress(&RustBackend::new(), &SourceImage::new(bytes, None), &params)?;
            let output_path = args
                .output
                .unwrap_or_else(|| compressed_path(&args.input, image.extension()));
            std::fs::write(&output_path, &image.bytes)?;
            output::print_compress_output(&args.input, source_size, &image, &output_path);
        }
        Command::Upload {
            input,
            cookie: header,
            endpoint,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let bytes = std::fs::read(&input)?;
            let mime = mime_for(&input);
            let mut upload = ImageUpload::new(RustBackend::new(), &config.images);
            let file = upload.select_file(mime, bytes)?;
            debug!(size = file.size(), name = %file.file_name, "selected");
            let client = cookie_client(&config, &header);
            let url = upload.upload(&client, &endpoint).await?;
            output::print_upload_output(url.as_deref());
        }
        Command::Token { cookie: header } => {
            let config = config::load_config(cli.config.as_deref())?;
            let name = &config.auth.cookie_name;
            let cookies = cookie::parse_cookie_header(&header);
            let joined =
                cookie::combine_chunks(&cookies, name).ok_or(cookie::CookieError::Missing)?;
            let token = cookie::decode_access_token(&joined)?;
            let session = cookie::decode_session(&joined).ok();
            output::print_token_output(name, &token, session.as_ref());
        }
        Command::Get { path, cookie: header } => {
            let config = config::load_config(cli.config.as_deref())?;
            let client = cookie_client(&config, header.as_deref().unwrap_or_default());
            match client.get::<Value>(&path).await {
                Ok(body) => output::print_response(&body),
                Err(e) => {
                    let details = validation::extract_validation_errors(&e);
                    let errors = validation::parse_validation_errors(&details);
                    output::print_validation_errors(&errors);
                    return Err(e.into());
                }
            }
        }
        Command::Units => {
            output::print_units();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Build a request pipeline whose token comes from a `Cookie` header.
///
/// When the cookie holds a full session it seeds a remote provider, so a
/// rejected token can still be refreshed.
fn cookie_client(config: &ClientConfig, header: &str) -> ApiClient {
    let name = &config.auth.cookie_name;
    let mut resolver = CookieCredentialResolver::from_header(name.clone(), header);

    let session = cookie::combine_chunks(&cookie::parse_cookie_header(header), name)
        .and_then(|joined| cookie::decode_session(&joined).ok())
        .filter(|session| !session.refresh_token.is_empty());
    if let Some(session) = session {
        let provider = RemoteSessionProvider::new(&config.auth);
        provider.set_session(session);
        let provider: Arc<dyn SessionProvider> = Arc::new(provider);
        resolver = resolver.with_provider(provider);
    }

    let transport = ReqwestTransport::new(config.api_base.clone());
    ApiClient::new(Arc::new(transport), Arc::new(resolver))
}

/// `photo.jpg` → `photo-compressed.<ext>` next to the input.
fn compressed_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}-compressed.{extension}"))
}

/// MIME type from the file extension, as a file picker would report it.
fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
