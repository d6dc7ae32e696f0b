use generation::{GenerationJob, GenerationQueue};
use shared::{
    domain::{Cast, CastId},
    error::{ApiError, ErrorCode},
    frame_state::{reduce, FrameAction, FrameState, Stage, MISSING_PROMPT_MESSAGE},
    lineage::{DerivativePlan, LINEAGE_LOCK_DEPTH},
    protocol::FrameButton,
};
use storage::{AssetStore, Storage};
use tracing::{info, warn};
use url::Url;

pub mod page;

pub use page::{CardKind, Dashboard, FrameImage, FramePage};

pub const CAST_NOT_FOUND: &str = "Could not find Cast.";
pub const PROMPT_PLACEHOLDER: &str = "add a prompt...";

/// Process-wide handles a frame request works with.
#[derive(Clone)]
pub struct FrameContext {
    pub storage: Storage,
    pub assets: AssetStore,
    pub generation: GenerationQueue,
    pub links: LinkConfig,
    /// Handle recorded as the owner of derivatives created through the frame.
    pub derivative_owner: String,
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    share_base_url: Url,
    profile_base_url: Url,
}

impl LinkConfig {
    pub fn new(share_base_url: Url, profile_base_url: Url) -> anyhow::Result<Self> {
        for url in [&share_base_url, &profile_base_url] {
            if url.cannot_be_a_base() {
                anyhow::bail!("link base url '{url}' cannot be a base");
            }
        }
        Ok(Self {
            share_base_url,
            profile_base_url,
        })
    }

    /// `<share base>/cast/<id>`
    pub fn share_url(&self, cast_id: CastId) -> Url {
        let id = cast_id.to_string();
        with_segments(&self.share_base_url, &["cast", id.as_str()])
    }

    pub fn profile_url(&self, handle: &str) -> Url {
        with_segments(&self.profile_base_url, &[handle])
    }
}

fn with_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

pub fn cast_pathname(cast_id: CastId) -> String {
    format!("/cast/{cast_id}")
}

/// Initial state on first paint, otherwise the previous state (or the
/// initial one when the host sent none) advanced by the action.
pub fn resolve_state(
    path_cast_id: CastId,
    previous: Option<FrameState>,
    action: Option<&FrameAction>,
) -> FrameState {
    match action {
        None => FrameState::initial(path_cast_id),
        Some(action) => {
            let previous = previous.unwrap_or_else(|| FrameState::initial(path_cast_id));
            reduce(&previous, action)
        }
    }
}

/// Resolves the next state and performs the side effects of its stage.
pub async fn handle_frame(
    ctx: &FrameContext,
    path_cast_id: CastId,
    previous: Option<FrameState>,
    action: Option<&FrameAction>,
) -> Result<FramePage, ApiError> {
    let mut state = resolve_state(path_cast_id, previous, action);
    let pathname = cast_pathname(path_cast_id);

    match state.stage {
        Stage::Error => {
            let message = state
                .error
                .clone()
                .unwrap_or_else(|| MISSING_PROMPT_MESSAGE.to_string());
            Ok(FramePage::new(pathname, state, FrameImage::Error { message })
                .button(FrameButton::post("Retry")))
        }
        Stage::Generate => {
            let parent = load_cast(ctx, state.current_cast_id).await?;
            let created = create_derivative(ctx, &parent, &state.input_text).await?;
            state.current_cast_id = created;
            Ok(generating_page(pathname, state))
        }
        Stage::Created => {
            let cast = load_cast(ctx, state.current_cast_id).await?;
            if cast.image_path.is_none() {
                return Ok(generating_page(pathname, state));
            }
            let image = cast_image(ctx, &cast, CardKind::Created)?;
            Ok(FramePage::new(cast_pathname(cast.id), state, image).button(
                FrameButton::link("Share as a cast to keep alive.", ctx.links.share_url(cast.id)),
            ))
        }
        Stage::Start => {
            let cast = load_cast(ctx, state.current_cast_id).await?;
            let image = cast_image(ctx, &cast, CardKind::Start)?;
            let image_url = match &image {
                FrameImage::Cast { url, .. } => Some(url.clone()),
                _ => None,
            };
            let mut page =
                FramePage::new(pathname, state, image).button(FrameButton::post("Join"));
            page.dashboard = Some(Dashboard {
                owner_profile_url: ctx.links.profile_url(&cast.farcaster_id),
                image_url,
                cast,
            });
            Ok(page)
        }
        Stage::View | Stage::Unknown => {
            let cast = load_cast(ctx, state.current_cast_id).await?;
            let kind = if cast.is_root() {
                CardKind::Root
            } else {
                CardKind::Derivative
            };
            let image = cast_image(ctx, &cast, kind)?;
            let mut page = FramePage::new(pathname, state, image)
                .button(FrameButton::link("Stats", ctx.links.share_url(cast.id)));
            if !cast.locked {
                page.input_placeholder = Some(PROMPT_PLACEHOLDER.to_string());
                page = page.button(FrameButton::post("Create"));
            }
            Ok(page)
        }
    }
}

/// Records the finished image of a pending cast.
pub async fn complete_generation(
    ctx: &FrameContext,
    cast_id: CastId,
    image_path: &str,
) -> Result<(), ApiError> {
    let image_path = image_path.trim();
    if image_path.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "image_path cannot be empty",
        ));
    }

    let updated = ctx
        .storage
        .set_image_path(cast_id, image_path)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::not_found(CAST_NOT_FOUND));
    }
    info!(cast_id = cast_id.0, %image_path, "generation completed");
    Ok(())
}

async fn load_cast(ctx: &FrameContext, cast_id: CastId) -> Result<Cast, ApiError> {
    ctx.storage
        .fetch_cast(cast_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found(CAST_NOT_FOUND))
}

async fn create_derivative(
    ctx: &FrameContext,
    parent: &Cast,
    prompt: &str,
) -> Result<CastId, ApiError> {
    let plan = DerivativePlan::for_parent(parent);
    let cast_id = ctx
        .storage
        .store_cast(&plan.new_cast(&parent.name, &ctx.derivative_owner, prompt))
        .await
        .map_err(internal)?;
    info!(
        cast_id = cast_id.0,
        parent_id = parent.id.0,
        branch_num = plan.branch_num,
        "derivative stored"
    );

    let source = parent.image_path.clone().unwrap_or_default();
    if source.is_empty() {
        warn!(parent_id = parent.id.0, "remixing a cast that has no image yet");
    }
    let job = GenerationJob {
        name: parent.name.clone(),
        image_path: source,
        prompt: prompt.to_string(),
        cast_id,
    };
    if let Err(error) = ctx.generation.submit(job) {
        warn!(cast_id = cast_id.0, %error, "failed to queue generation");
    }

    match plan.lock_target() {
        Some(root) => match ctx.storage.lock_layer(root).await {
            Ok(()) => info!(root_id = root.0, "lineage reached its last branch; root locked"),
            Err(error) => warn!(root_id = root.0, %error, "failed to lock lineage root"),
        },
        None if plan.branch_num == LINEAGE_LOCK_DEPTH => {
            warn!(cast_id = cast_id.0, "last branch has no layer 1 root to lock");
        }
        None => {}
    }

    Ok(cast_id)
}

fn generating_page(pathname: String, state: FrameState) -> FramePage {
    FramePage::new(pathname, state, FrameImage::Generating).button(FrameButton::post("Refresh"))
}

fn cast_image(ctx: &FrameContext, cast: &Cast, kind: CardKind) -> Result<FrameImage, ApiError> {
    let Some(path) = cast.image_path.as_deref() else {
        return Ok(FrameImage::Generating);
    };
    let url = ctx.assets.public_url(path).map_err(internal)?;
    Ok(FrameImage::Cast { url, kind })
}

fn internal(e: anyhow::Error) -> ApiError {
    ApiError::internal(format!("{e:#}"))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
