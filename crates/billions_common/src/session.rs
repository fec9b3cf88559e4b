//! In-process member session.
//!
//! Holds the signed-in member and the store it mirrors. Every mutation runs
//! the shared transaction, persists the result, and only then updates the
//! in-memory copy, so the session never shows state the store does not have.

use crate::accounts::{sign_up, SignUpRequest};
use crate::error::SessionError;
use crate::progression::{apply_experience, apply_game_result, apply_points, ExperienceOutcome};
use crate::store::{ProfileUpdate, UserProfile, UserStore};
use crate::verification::VerificationStatus;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Session {
    store: Arc<dyn UserStore>,
    user: Option<UserProfile>,
}

impl Session {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store, user: None }
    }

    /// Currently signed-in member
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Load an already-authenticated member's record
    pub fn sign_in(&mut self, user_id: &str) -> Result<&UserProfile, SessionError> {
        let profile = self.store.get_user(user_id)?;
        debug!("Session signed in as {}", profile.id);
        Ok(self.user.insert(profile))
    }

    /// Create a member record and sign in as it
    pub fn sign_up(&mut self, request: &SignUpRequest) -> Result<&UserProfile, SessionError> {
        let profile = sign_up(self.store.as_ref(), request)?;
        Ok(self.user.insert(profile))
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }

    fn current(&self) -> Result<&UserProfile, SessionError> {
        self.user.as_ref().ok_or(SessionError::NotSignedIn)
    }

    pub fn add_experience(&mut self, amount: i64) -> Result<ExperienceOutcome, SessionError> {
        let user = self.current()?;
        let outcome = apply_experience(&user.progression, amount);
        self.commit_progression(outcome)
    }

    /// Returns the new points balance
    pub fn add_points(&mut self, amount: i64) -> Result<i64, SessionError> {
        let user = self.current()?;
        let progression = apply_points(&user.progression, amount);
        self.store.update_progression(&user.id, &progression)?;

        let user = self.user.as_mut().ok_or(SessionError::NotSignedIn)?;
        user.progression = progression;
        Ok(progression.points)
    }

    /// Apply a game's raw (points, experience) pair as one write
    pub fn record_game(&mut self, points: i64, experience: i64) -> Result<ExperienceOutcome, SessionError> {
        let user = self.current()?;
        let outcome = apply_game_result(&user.progression, points, experience);
        self.commit_progression(outcome)
    }

    fn commit_progression(&mut self, outcome: ExperienceOutcome) -> Result<ExperienceOutcome, SessionError> {
        let user = self.user.as_mut().ok_or(SessionError::NotSignedIn)?;
        self.store.update_progression(&user.id, &outcome.progression)?;
        user.progression = outcome.progression;

        if outcome.leveled_up() {
            info!("{} reached level {}", user.username, user.progression.level);
        }
        Ok(outcome)
    }

    /// Write only the supplied fields
    pub fn update_profile(&mut self, update: &ProfileUpdate) -> Result<&UserProfile, SessionError> {
        let id = self.current()?.id.clone();
        if update.is_empty() {
            return self.current();
        }
        let profile = self.store.update_profile(&id, update)?;
        Ok(self.user.insert(profile))
    }

    pub fn update_verification_status(&mut self, status: VerificationStatus) -> Result<(), SessionError> {
        let user = self.user.as_mut().ok_or(SessionError::NotSignedIn)?;
        self.store.set_verification(&user.id, status)?;
        user.verification_status = status;
        user.is_verified = status.is_verified();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AvatarType, SqliteUserStore};

    fn signed_in_session() -> (Session, Arc<SqliteUserStore>) {
        let store = Arc::new(SqliteUserStore::open_in_memory().unwrap());
        let mut session = Session::new(store.clone());
        session
            .sign_up(&SignUpRequest {
                email: "player@example.com".to_string(),
                username: "player".to_string(),
                avatar_type: AvatarType::Rabbit,
                referral_code: None,
            })
            .unwrap();
        (session, store)
    }

    #[test]
    fn test_requires_sign_in() {
        let store = Arc::new(SqliteUserStore::open_in_memory().unwrap());
        let mut session = Session::new(store);
        assert!(matches!(session.add_points(10), Err(SessionError::NotSignedIn)));
        assert!(matches!(session.add_experience(10), Err(SessionError::NotSignedIn)));
        assert!(matches!(
            session.update_verification_status(VerificationStatus::Verified),
            Err(SessionError::NotSignedIn)
        ));
    }

    #[test]
    fn test_mutations_reach_the_store() {
        let (mut session, store) = signed_in_session();
        let id = session.user().unwrap().id.clone();

        assert_eq!(session.add_points(-1500).unwrap(), 0);
        let outcome = session.add_experience(1_050).unwrap();
        assert!(outcome.leveled_up());

        let stored = store.get_progression(&id).unwrap();
        assert_eq!(stored, session.user().unwrap().progression);
        assert_eq!(stored.points, 0);
        assert_eq!(stored.level.value(), 2);
        assert_eq!(stored.experience, 50);
    }

    #[test]
    fn test_record_game() {
        let (mut session, _store) = signed_in_session();
        let outcome = session.record_game(100, 50).unwrap();
        assert_eq!(outcome.progression.points, 1100);
        assert_eq!(outcome.progression.experience, 50);
    }

    #[test]
    fn test_profile_and_verification() {
        let (mut session, store) = signed_in_session();
        let id = session.user().unwrap().id.clone();

        let updated = session
            .update_profile(&ProfileUpdate {
                username: Some("renamed".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.avatar_type, AvatarType::Rabbit);

        session
            .update_verification_status(VerificationStatus::UnderReview)
            .unwrap();
        assert!(!session.user().unwrap().is_verified);

        session.update_verification_status(VerificationStatus::Verified).unwrap();
        let stored = store.get_user(&id).unwrap();
        assert!(stored.is_verified);
        assert_eq!(stored.verification_status, VerificationStatus::Verified);
    }

    #[test]
    fn test_sign_out_and_back_in() {
        let (mut session, _store) = signed_in_session();
        let id = session.user().unwrap().id.clone();
        session.add_points(25).unwrap();

        session.sign_out();
        assert!(!session.is_signed_in());

        let profile = session.sign_in(&id).unwrap();
        assert_eq!(profile.progression.points, 1025);
    }
}
