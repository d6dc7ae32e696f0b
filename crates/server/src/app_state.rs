use frame_api::FrameContext;
use url::Url;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) frames: FrameContext,
    pub(crate) public_url: Url,
}
