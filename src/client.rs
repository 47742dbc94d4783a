use aws_config::{
    default_provider::credentials::DefaultCredentialsChain,
    meta::region::RegionProviderChain};
use aws_sdk_s3::{
    Client,
    Region as Region};
use aws_types::SdkConfig;
use tracing::debug;


pub const REGION: &str = "us-west-2";
pub const PROFILE: &str = "default";


/// load the shared config for the given region. Credentials come from the default chain
/// (environment, profile files, web identity, instance role), reading the named profile.
pub async fn load_config(region: &Region, profile: &str) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(region.clone());
    let credentials = DefaultCredentialsChain::builder()
        .profile_name(profile)
        .region(region.clone())
        .build()
        .await;

    aws_config::from_env()
        .region(region_provider)
        .credentials_provider(credentials)
        .load()
        .await
}

/// get a client for the given region, using credentials of the named profile
pub async fn get_region_client(region: &str, profile: &str) -> (Region, Client) {
    let region = Region::new(region.to_owned());
    let shared_config = load_config(&region, profile).await;
    let client = Client::new(&shared_config);
    debug!(region = %region, profile, "created S3 client");

    (region, client)
}


#[cfg(test)]
mod tests {
    use super::*;
    use aws_types::credentials::ProvideCredentials;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_environment_credentials_win_over_missing_profile() {
        std::env::set_var("AWS_ACCESS_KEY_ID", "AKIDPURGETEST");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "purge-test-secret");

        let config = load_config(&Region::new(REGION), "no-such-profile-for-purge").await;
        let credentials = config.credentials_provider()
            .expect("credentials provider configured")
            .provide_credentials()
            .await
            .expect("credentials from the environment");

        assert_eq!(credentials.access_key_id(), "AKIDPURGETEST");
        assert_eq!(config.region(), Some(&Region::new(REGION)));
    }
}
