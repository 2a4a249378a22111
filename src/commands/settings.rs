use crate::commands::AppState;
use crate::models::TierSnapshot;

pub async fn restore_settings(state: &AppState) -> Result<TierSnapshot, String> {
    state.tier.restore().await.map_err(|err| err.user_message())
}

pub async fn settings_snapshot(state: &AppState) -> TierSnapshot {
    state.tier.snapshot().await
}

pub async fn toggle_pro_model(state: &AppState) -> Result<TierSnapshot, String> {
    state
        .tier
        .toggle_tier()
        .await
        .map_err(|err| err.user_message())?;
    Ok(state.tier.snapshot().await)
}

/// Opens the host key-selection flow.
pub async fn connect_key(state: &AppState) -> Result<TierSnapshot, String> {
    state
        .tier
        .request_credential()
        .await
        .map_err(|err| err.user_message())?;
    Ok(state.tier.snapshot().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::credentials::{CredentialCapability, EnvKeyHost, MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn connect_key_enables_pro_once_key_is_linked() -> Result<(), String> {
        let var = "NANO_BANANA_TEST_KEY_CONNECT";
        std::env::remove_var(var);
        let config = AppConfig::default().with_api_key_env_vars([var]);
        let host = EnvKeyHost::new(config.clone())
            .with_selection_hook(Arc::new(|| std::env::set_var("NANO_BANANA_TEST_KEY_CONNECT", "k")));
        let state = AppState::new(
            config,
            CredentialCapability::present(host),
            Arc::new(MemoryStore::default()),
        );

        let restored = restore_settings(&state).await?;
        assert!(!restored.credential_present);

        let linked = connect_key(&state).await?;
        assert!(linked.tier_enabled);
        assert!(linked.credential_present);

        let toggled = toggle_pro_model(&state).await?;
        assert!(!toggled.tier_enabled);
        assert_eq!(settings_snapshot(&state).await, toggled);
        std::env::remove_var(var);
        Ok(())
    }
}
