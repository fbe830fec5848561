use crate::core::{HostPlatform, PlatformFamily, SigningStrategy};

/// Decides which signing step, if any, applies to an artifact of `family`
/// built on `host`. macOS signing needs a macOS host; Windows signing runs
/// from any host.
pub fn signing_strategy(family: PlatformFamily, host: HostPlatform) -> SigningStrategy {
    match (family, host) {
        (PlatformFamily::MacOs, HostPlatform::MacOs) => SigningStrategy::MacSign,
        (PlatformFamily::Windows, _) => SigningStrategy::WinSign,
        _ => SigningStrategy::None,
    }
}
