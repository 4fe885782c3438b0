//! Password recovery flow

use std::sync::Arc;

use chrono::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{
    Clock, DomainError, Email, MailMessage, Mailer, ResetToken, ResetTokenRepository,
    TokenRepository, TokenValue, UserRepository,
};
use crate::infrastructure::token::{GeneratedSecret, SecretGenerator};
use crate::infrastructure::user::{CredentialService, PasswordHasher};

/// Recovery settings
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// How long a reset token stays usable
    pub validity: Duration,
    /// Floor on the duration of a reset request, whatever the outcome
    pub min_response: std::time::Duration,
    /// Base of the link sent by mail; the token is appended as a query parameter
    pub reset_url: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            validity: Duration::minutes(60),
            min_response: std::time::Duration::from_millis(400),
            reset_url: "http://localhost:8080/reset-password".to_string(),
        }
    }
}

/// Forgot-password and reset-password operations
#[derive(Debug)]
pub struct RecoveryService<U, H, T, P>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenRepository,
    P: ResetTokenRepository,
{
    credentials: Arc<CredentialService<U, H, T>>,
    repository: Arc<P>,
    mailer: Arc<dyn Mailer>,
    generator: SecretGenerator,
    clock: Arc<dyn Clock>,
    config: RecoveryConfig,
}

impl<U, H, T, P> RecoveryService<U, H, T, P>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenRepository,
    P: ResetTokenRepository,
{
    /// Create a new recovery service
    pub fn new(
        credentials: Arc<CredentialService<U, H, T>>,
        repository: Arc<P>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            credentials,
            repository,
            mailer,
            generator: SecretGenerator::reset(),
            clock,
            config,
        }
    }

    /// Start a reset for `email`
    ///
    /// Always succeeds, so the caller learns nothing about whether the account
    /// exists. A secret is generated on every path and the call is padded to
    /// `min_response`. Internal failures are logged.
    pub async fn request_reset(&self, email: &str) -> Result<(), DomainError> {
        let started = Instant::now();
        let secret = self.generator.generate();

        if let Err(e) = self.issue_and_send(email, secret).await {
            warn!(error = %e, kind = ?e.kind(), "Password reset request not completed");
        }

        let elapsed = started.elapsed();
        if elapsed > self.config.min_response {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                floor_ms = self.config.min_response.as_millis() as u64,
                "Password reset request outlasted its response floor, raise recovery.min_response_ms"
            );
        }

        tokio::time::sleep_until(started + self.config.min_response).await;
        Ok(())
    }

    async fn issue_and_send(&self, email: &str, secret: GeneratedSecret) -> Result<(), DomainError> {
        let Some(user) = self.credentials.get(email).await? else {
            debug!("Password reset requested for unknown account");
            return Ok(());
        };

        let now = self.clock.now();
        let token = self
            .repository
            .create(ResetToken::new(
                secret.hash,
                user.email().clone(),
                now,
                now + self.config.validity,
            ))
            .await?;

        info!(email = %user.email(), expires_at = %token.expires_at(), "Issued password reset token");

        let message = self.reset_message(user.email(), &secret.value, &token);
        self.mailer
            .send(message)
            .await
            .map_err(|e| DomainError::notification(e.to_string()))
    }

    fn reset_message(&self, to: &Email, value: &TokenValue, token: &ResetToken) -> MailMessage {
        let separator = if self.config.reset_url.contains('?') { '&' } else { '?' };

        MailMessage {
            to: to.clone(),
            subject: "Password reset".to_string(),
            body: format!(
                "A password reset was requested for {}.\n\n\
                 Choose a new password here:\n{}{}token={}\n\n\
                 The link expires at {} and works once. \
                 If you did not ask for this, ignore this message.\n",
                to,
                self.config.reset_url,
                separator,
                value.expose(),
                token.expires_at().format("%Y-%m-%d %H:%M UTC"),
            ),
        }
    }

    /// Finish a reset: consume the token, set the password, end all sessions
    ///
    /// Only one completion per token can succeed. A password rejected by the
    /// policy does not consume the token.
    pub async fn complete_reset(&self, token: &str, new_password: &str) -> Result<(), DomainError> {
        self.credentials.check_password(new_password)?;

        let token_hash = SecretGenerator::hash(token);

        let claimed = self
            .repository
            .claim(&token_hash, self.clock.now())
            .await?
            .ok_or(DomainError::InvalidOrExpiredResetToken)?;

        match self.credentials.replace_password(claimed.user(), new_password).await {
            Ok(_) => {}
            Err(e) if e.is_applied() => {
                // The password did change, so the link stays spent
                warn!(email = %claimed.user(), error = ?e, "Password reset but sessions not revoked");
                self.repository.delete_for_user(claimed.user()).await?;
                return Err(e.into_inner());
            }
            Err(e) => {
                warn!(email = %claimed.user(), error = ?e, "Password update failed, releasing reset token");
                self.repository.release(&token_hash).await?;
                return Err(e.into_inner());
            }
        }

        // Other outstanding reset links for the account are void now
        self.repository.delete_for_user(claimed.user()).await?;

        info!(email = %claimed.user(), "Completed password reset");
        Ok(())
    }

    /// Drop every outstanding reset token of a user
    pub async fn forget_user(&self, user: &Email) -> Result<usize, DomainError> {
        self.repository.delete_for_user(user).await
    }

    /// Remove used and expired reset tokens
    pub async fn prune_expired(&self) -> Result<usize, DomainError> {
        let pruned = self.repository.prune(self.clock.now()).await?;
        if pruned > 0 {
            debug!(count = pruned, "Pruned reset tokens");
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mail::MockMailer;
    use crate::domain::token::MockTokenRepository;
    use crate::domain::{MailError, ManualClock, PasswordPolicy};
    use crate::infrastructure::mail::InMemoryMailer;
    use crate::infrastructure::recovery::InMemoryResetTokenRepository;
    use crate::infrastructure::token::{TokenConfig, TokenService};
    use crate::infrastructure::user::{Argon2Hasher, HashCost, InMemoryUserRepository};

    type Credentials = CredentialService<InMemoryUserRepository, Argon2Hasher, MockTokenRepository>;
    type Service = RecoveryService<
        InMemoryUserRepository,
        Argon2Hasher,
        MockTokenRepository,
        InMemoryResetTokenRepository,
    >;

    struct Fixture {
        service: Arc<Service>,
        credentials: Arc<Credentials>,
        tokens: Arc<TokenService<MockTokenRepository>>,
        token_repository: Arc<MockTokenRepository>,
        resets: Arc<InMemoryResetTokenRepository>,
        clock: Arc<ManualClock>,
    }

    fn config() -> RecoveryConfig {
        RecoveryConfig {
            min_response: std::time::Duration::from_millis(30),
            reset_url: "https://example.com/reset".to_string(),
            ..RecoveryConfig::default()
        }
    }

    async fn fixture(mailer: Arc<dyn Mailer>) -> Fixture {
        fixture_with(mailer, config()).await
    }

    async fn fixture_with(mailer: Arc<dyn Mailer>, config: RecoveryConfig) -> Fixture {
        let clock = Arc::new(ManualClock::starting_now());
        let token_repository = Arc::new(MockTokenRepository::new());
        let tokens = Arc::new(TokenService::new(
            token_repository.clone(),
            clock.clone(),
            TokenConfig::default(),
        ));
        let credentials = Arc::new(CredentialService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(Argon2Hasher::new(HashCost::minimal()).unwrap()),
            tokens.clone(),
            clock.clone(),
            PasswordPolicy::default(),
        ));
        credentials.create("alice@example.com", "s3cret!").await.unwrap();

        let resets = Arc::new(InMemoryResetTokenRepository::new());
        let service = Arc::new(RecoveryService::new(
            credentials.clone(),
            resets.clone(),
            mailer,
            clock.clone(),
            config,
        ));

        Fixture {
            service,
            credentials,
            tokens,
            token_repository,
            resets,
            clock,
        }
    }

    fn token_from(message: &MailMessage) -> String {
        message
            .body
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap()
            .to_string()
    }

    async fn requested_token(f: &Fixture, mailer: &InMemoryMailer) -> String {
        f.service.request_reset("alice@example.com").await.unwrap();
        let messages = mailer.messages().await;
        token_from(messages.last().unwrap())
    }

    #[tokio::test]
    async fn test_request_reset_sends_link() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;

        f.service.request_reset(" Alice@Example.com ").await.unwrap();

        let messages = mailer.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to.as_str(), "alice@example.com");
        assert!(messages[0].body.contains("https://example.com/reset?token=gtr_"));
        assert_eq!(f.resets.len().await, 1);
    }

    #[tokio::test]
    async fn test_request_reset_unknown_email_has_no_effect() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;

        assert!(f.service.request_reset("ghost@example.com").await.is_ok());
        assert!(f.service.request_reset("not an email").await.is_ok());

        assert!(mailer.messages().await.is_empty());
        assert!(f.resets.is_empty().await);
    }

    #[tokio::test]
    async fn test_request_reset_takes_the_same_floor_time() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer).await;
        let floor = config().min_response;

        let started = Instant::now();
        f.service.request_reset("alice@example.com").await.unwrap();
        let existing = started.elapsed();

        let started = Instant::now();
        f.service.request_reset("ghost@example.com").await.unwrap();
        let unknown = started.elapsed();

        assert!(existing >= floor);
        assert!(unknown >= floor);
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_token_usable() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(MailError::Unavailable("smtp down".to_string())));

        let f = fixture(Arc::new(mailer)).await;

        assert!(f.service.request_reset("alice@example.com").await.is_ok());
        assert_eq!(f.resets.len().await, 1);
    }

    #[tokio::test]
    async fn test_complete_reset_once() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;
        let session = f.credentials.login("alice@example.com", "s3cret!").await.unwrap();

        let token = requested_token(&f, &mailer).await;

        f.service.complete_reset(&token, "n3w-pass").await.unwrap();

        assert!(f.credentials.authenticate("alice@example.com", "n3w-pass").await.is_ok());
        assert!(matches!(
            f.tokens.validate(session.value.expose()).await,
            Err(DomainError::TokenRevoked)
        ));

        let second = f.service.complete_reset(&token, "other-pass").await;
        assert!(matches!(second, Err(DomainError::InvalidOrExpiredResetToken)));
    }

    #[tokio::test]
    async fn test_complete_reset_rejects_unknown_and_expired() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;

        let unknown = f.service.complete_reset("gtr_unknown", "n3w-pass").await;
        assert!(matches!(unknown, Err(DomainError::InvalidOrExpiredResetToken)));

        let token = requested_token(&f, &mailer).await;
        f.clock.advance(Duration::minutes(61));

        let expired = f.service.complete_reset(&token, "n3w-pass").await;
        assert!(matches!(expired, Err(DomainError::InvalidOrExpiredResetToken)));
    }

    #[tokio::test]
    async fn test_weak_password_does_not_burn_token() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;
        let token = requested_token(&f, &mailer).await;

        let weak = f.service.complete_reset(&token, "123").await;
        assert!(matches!(weak, Err(DomainError::InvalidCredentialFormat { .. })));

        f.service.complete_reset(&token, "n3w-pass").await.unwrap();
    }

    #[tokio::test]
    async fn test_completion_voids_other_links() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;
        let first = requested_token(&f, &mailer).await;
        let second = requested_token(&f, &mailer).await;

        f.service.complete_reset(&second, "n3w-pass").await.unwrap();

        let stale = f.service.complete_reset(&first, "other-pass").await;
        assert!(matches!(stale, Err(DomainError::InvalidOrExpiredResetToken)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_completions_single_winner() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;
        let token = requested_token(&f, &mailer).await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = f.service.clone();
                let token = token.clone();
                tokio::spawn(async move {
                    service
                        .complete_reset(&token, &format!("password-{}", i))
                        .await
                })
            })
            .collect();

        let results = futures::future::join_all(handles).await;
        let winners = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_prune_expired() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;
        requested_token(&f, &mailer).await;
        requested_token(&f, &mailer).await;

        assert_eq!(f.service.prune_expired().await.unwrap(), 0);

        f.clock.advance(Duration::minutes(60));
        assert_eq!(f.service.prune_expired().await.unwrap(), 2);
    }

    /// Mailer that takes a while before handing over to the outbox
    #[derive(Debug)]
    struct SlowMailer {
        outbox: InMemoryMailer,
        delay: std::time::Duration,
    }

    #[async_trait::async_trait]
    impl Mailer for SlowMailer {
        async fn send(&self, message: MailMessage) -> Result<(), MailError> {
            tokio::time::sleep(self.delay).await;
            self.outbox.send(message).await
        }
    }

    #[tokio::test]
    async fn test_slow_mailer_under_floor_keeps_paths_indistinguishable() {
        let floor = std::time::Duration::from_millis(200);
        let mailer = Arc::new(SlowMailer {
            outbox: InMemoryMailer::new(),
            delay: std::time::Duration::from_millis(150),
        });
        let f = fixture_with(
            mailer.clone(),
            RecoveryConfig {
                min_response: floor,
                ..config()
            },
        )
        .await;

        let started = Instant::now();
        f.service.request_reset("alice@example.com").await.unwrap();
        let existing = started.elapsed();

        let started = Instant::now();
        f.service.request_reset("ghost@example.com").await.unwrap();
        let unknown = started.elapsed();

        assert_eq!(mailer.outbox.messages().await.len(), 1);
        assert!(existing >= floor && unknown >= floor);

        let tolerance = std::time::Duration::from_millis(40);
        let gap = if existing > unknown {
            existing - unknown
        } else {
            unknown - existing
        };
        assert!(gap < tolerance, "existing {:?} vs unknown {:?}", existing, unknown);
    }

    #[tokio::test]
    async fn test_failed_session_revocation_still_spends_token() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;
        let token = requested_token(&f, &mailer).await;

        f.token_repository.set_fail_revocations(true);
        let result = f.service.complete_reset(&token, "n3w-pass").await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));

        assert!(f.credentials.authenticate("alice@example.com", "n3w-pass").await.is_ok());
        assert!(f.resets.is_empty().await);

        f.token_repository.set_fail_revocations(false);
        let replay = f.service.complete_reset(&token, "other-pass").await;
        assert!(matches!(replay, Err(DomainError::InvalidOrExpiredResetToken)));
    }

    #[tokio::test]
    async fn test_failed_password_write_releases_token() {
        let mailer = Arc::new(InMemoryMailer::new());
        let f = fixture(mailer.clone()).await;
        let token = requested_token(&f, &mailer).await;

        f.credentials
            .delete(&Email::parse("alice@example.com").unwrap())
            .await
            .unwrap();
        let result = f.service.complete_reset(&token, "n3w-pass").await;
        assert!(matches!(result, Err(DomainError::UserNotFound { .. })));

        assert_eq!(f.resets.len().await, 1);
    }
}
