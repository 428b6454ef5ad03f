use reqwest::{Client, RequestBuilder};
use tracing::{error, info, warn};

use crate::domain::{
    common::{ProfileStoreConfig, entities::app_errors::CoreError},
    subscription::{
        entities::{ProfileUpdate, UserProfile},
        ports::UserProfileRepository,
    },
};

const PROFILES_TABLE: &str = "user_profiles";

#[derive(Debug, Clone)]
struct PostgrestConnection {
    rest_url: String,
    key: String,
}

/// `user_profiles` table accessed through the hosted PostgREST endpoint.
///
/// Built without credentials the repository is unavailable: reads and writes
/// fail with [`CoreError::ProfileStoreUnavailable`].
#[derive(Debug, Clone)]
pub struct SupabaseUserProfileRepository {
    connection: Option<PostgrestConnection>,
    client: Client,
}

impl SupabaseUserProfileRepository {
    pub fn new(config: Option<&ProfileStoreConfig>) -> Self {
        let connection = match config {
            Some(config) => {
                info!(key_kind = ?config.key_kind, "Profile store client initialized");
                Some(PostgrestConnection {
                    rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
                    key: config.key.clone(),
                })
            }
            None => {
                warn!("Profile store credentials not found, subscription features are limited");
                None
            }
        };

        Self {
            connection,
            client: Client::new(),
        }
    }

    fn connection(&self) -> Result<&PostgrestConnection, CoreError> {
        self.connection
            .as_ref()
            .ok_or(CoreError::ProfileStoreUnavailable)
    }

    fn table_url(connection: &PostgrestConnection, column: &str, value: &str) -> String {
        format!(
            "{}/{}?{}=eq.{}",
            connection.rest_url,
            PROFILES_TABLE,
            column,
            urlencoding::encode(value)
        )
    }

    fn authorize(request: RequestBuilder, connection: &PostgrestConnection) -> RequestBuilder {
        request
            .header("apikey", &connection.key)
            .bearer_auth(&connection.key)
    }

    async fn update_where(
        &self,
        column: &str,
        value: String,
        update: ProfileUpdate,
    ) -> Result<(), CoreError> {
        let connection = self.connection()?;

        let request = self
            .client
            .patch(Self::table_url(connection, column, &value))
            .header("Prefer", "return=minimal")
            .json(&update);

        let response = Self::authorize(request, connection)
            .send()
            .await
            .map_err(|e| {
                error!("Profile store request failed: {}", e);
                CoreError::ExternalServiceError(format!("Profile store error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Profile store update error: {} - {}", status, error_text);
            return Err(CoreError::ExternalServiceError(format!(
                "Profile store returned error: {} - {}",
                status, error_text
            )));
        }

        Ok(())
    }
}

impl UserProfileRepository for SupabaseUserProfileRepository {
    fn is_available(&self) -> bool {
        self.connection.is_some()
    }

    async fn get_by_uid(&self, uid: String) -> Result<Option<UserProfile>, CoreError> {
        let connection = self.connection()?;

        let url = format!("{}&select=*", Self::table_url(connection, "uid", &uid));
        let response = Self::authorize(self.client.get(url), connection)
            .send()
            .await
            .map_err(|e| {
                error!("Profile store request failed: {}", e);
                CoreError::ExternalServiceError(format!("Profile store error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Profile store query error: {} - {}", status, error_text);
            return Err(CoreError::ExternalServiceError(format!(
                "Profile store returned error: {} - {}",
                status, error_text
            )));
        }

        let rows: Vec<UserProfile> = response.json().await.map_err(|e| {
            error!("Failed to parse profile rows: {}", e);
            CoreError::ExternalServiceError(format!("Failed to parse profile rows: {}", e))
        })?;

        Ok(rows.into_iter().next())
    }

    async fn update_by_uid(&self, uid: String, update: ProfileUpdate) -> Result<(), CoreError> {
        self.update_where("uid", uid, update).await
    }

    async fn update_by_subscription_id(
        &self,
        subscription_id: String,
        update: ProfileUpdate,
    ) -> Result<(), CoreError> {
        self.update_where("stripe_subscription_id", subscription_id, update)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::common::ProfileStoreKeyKind;

    #[tokio::test]
    async fn test_unconfigured_repository_is_unavailable() {
        let repository = SupabaseUserProfileRepository::new(None);

        assert!(!repository.is_available());
        assert_eq!(
            repository.get_by_uid("user-1".to_string()).await,
            Err(CoreError::ProfileStoreUnavailable)
        );
        assert_eq!(
            repository
                .update_by_uid("user-1".to_string(), ProfileUpdate::default())
                .await,
            Err(CoreError::ProfileStoreUnavailable)
        );
    }

    #[test]
    fn test_table_url_encodes_filter_value() {
        let repository = SupabaseUserProfileRepository::new(Some(&ProfileStoreConfig {
            url: "https://project.supabase.co/".to_string(),
            key: "service".to_string(),
            key_kind: ProfileStoreKeyKind::ServiceRole,
        }));

        let connection = repository.connection().unwrap();
        assert_eq!(
            SupabaseUserProfileRepository::table_url(connection, "uid", "a b&c"),
            "https://project.supabase.co/rest/v1/user_profiles?uid=eq.a%20b%26c"
        );
    }
}
