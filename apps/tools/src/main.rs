use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::{
    domain::{CastId, NewCast},
    error::{ApiException, ErrorCode},
};
use storage::Storage;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/artcast.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the root cast of a new lineage.
    SeedRoot {
        name: String,
        owner: String,
        image_path: String,
    },
    /// Record the finished image of a pending cast.
    CompleteImage { cast_id: i64, image_path: String },
    ShowCast { cast_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::SeedRoot {
            name,
            owner,
            image_path,
        } => {
            let cast_id = storage
                .store_cast(&NewCast::root(name, owner, image_path))
                .await?;
            info!(cast_id = cast_id.0, "seeded root cast");
            println!("created cast_id={cast_id}");
        }
        Command::CompleteImage {
            cast_id,
            image_path,
        } => {
            if !storage.set_image_path(CastId(cast_id), &image_path).await? {
                return Err(
                    ApiException::new(ErrorCode::NotFound, format!("cast {cast_id} not found"))
                        .into(),
                );
            }
            println!("cast_id={cast_id} image_path={image_path}");
        }
        Command::ShowCast { cast_id } => {
            let cast = storage.fetch_cast(CastId(cast_id)).await?.ok_or_else(|| {
                ApiException::new(ErrorCode::NotFound, format!("cast {cast_id} not found"))
            })?;
            println!("#{} {} by @{}", cast.id, cast.name, cast.farcaster_id);
            println!(
                "branch={} parent={} layer_1={} locked={}",
                cast.branch_num,
                cast.parent_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
                cast.layer_1_cast_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".into()),
                cast.locked
            );
            println!(
                "image={} remixes: direct={} total={}",
                cast.image_path.as_deref().unwrap_or("(generating)"),
                cast.num_derivatives,
                cast.num_total_derivatives
            );
            for prompt in &cast.latest_prompts {
                println!("  prompt #{}: {}", prompt.cast_id, prompt.prompt_input);
            }
        }
    }

    Ok(())
}
