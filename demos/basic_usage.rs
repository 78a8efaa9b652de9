use std::sync::Arc;
use std::time::Duration;

use edge_jwt::validate;
use edge_jwt::JwtVerifier;
use edge_jwt::JwtVerifierConfig;
use edge_jwt::KeyStore;
use edge_jwt::KeyStoreConfig;
use edge_jwt::VerificationOptions;
use edge_jwt::VerifyJwt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Example JWT token (this is just a placeholder - use a real token in practice)
    let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";

    // Example 1: Cognito user pool with default settings
    println!("=== Example 1: Cognito User Pool ===");
    let config =
        JwtVerifierConfig::for_cognito_user_pool("us-east-1", "us-east-1_example", "my-app-client");
    let verifier = JwtVerifier::new(config);

    match verifier.verify(token).await {
        Ok(claims) => {
            println!("✓ Token verified successfully!");
            println!("  Subject: {:?}", claims.sub());
            println!("  Groups: {:?}", claims.get("cognito:groups"));
        }
        Err(e) => {
            eprintln!("✗ Token verification failed ({}): {}", e.kind(), e);
        }
    }

    println!();

    // Example 2: One key store shared by several verifiers
    println!("=== Example 2: Shared Key Store ===");
    let key_store = Arc::new(KeyStore::new(
        KeyStoreConfig::new()
            .with_fetch_timeout(Duration::from_secs(3))
            .with_requests_per_minute(5)?,
    ));

    let id_tokens = JwtVerifier::with_key_store(
        JwtVerifierConfig::for_cognito_user_pool("us-east-1", "us-east-1_example", "web-client"),
        Arc::clone(&key_store),
    );
    let mobile_tokens = JwtVerifier::with_key_store(
        JwtVerifierConfig::for_cognito_user_pool("us-east-1", "us-east-1_example", "mobile-client"),
        Arc::clone(&key_store),
    );

    for verifier in [&id_tokens, &mobile_tokens] {
        let audience = verifier.config().expected_audience();
        match verifier.verify(token).await {
            Ok(_) => println!("✓ Accepted for {audience}"),
            Err(e) => eprintln!("✗ Rejected for {audience}: {}", e.kind()),
        }
    }

    println!();

    // Example 3: Calling the validation entry point directly
    println!("=== Example 3: Direct Validation ===");
    let issuer = "https://idp.example.com";
    let options = VerificationOptions::new(issuer, "my-service");

    match validate(&key_store, token, "https://idp.example.com/jwks.json", &options).await {
        Ok(claims) => println!("✓ Claims: {:?}", claims.as_map()),
        Err(e) => eprintln!("✗ Token verification failed: {}", e),
    }

    Ok(())
}
