//! User service for business logic operations.
//!
//! Provides a higher-level API for user operations, encapsulating
//! business rules and coordinating with the repository layer.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::UserRepository;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::storage::{INVALID_FILE_TYPE_MESSAGE, Storage, StorageFolder, StoredFile};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// User service for handling user-related business logic.
///
/// Since `UserRepository` uses `Arc` internally via the connection pool,
/// cloning is cheap.
#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    storage: Storage,
}

impl UserService {
    pub fn new(repo: UserRepository, storage: Storage) -> Self {
        Self { repo, storage }
    }

    /// Registers a new user with a hashed password.
    ///
    /// # Errors
    /// `Conflict` when the email is already registered
    pub async fn signup(&self, name: String, email: String, password: &str) -> AppResult<User> {
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email is already registered"));
        }

        let new_user = NewUser {
            name,
            email,
            password: hash_password(password)?,
        };
        let user = self.repo.create(new_user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Checks credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn signin(&self, email: &str, password: &str) -> AppResult<User> {
        let invalid = || AppError::BadRequest {
            message: INVALID_CREDENTIALS.to_string(),
        };

        let user = self.repo.find_by_email(email).await?.ok_or_else(invalid)?;

        match verify_password(password, &user.password) {
            Ok(true) => Ok(user),
            Ok(false) => Err(invalid()),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Stored password hash rejected");
                Err(invalid())
            }
        }
    }

    /// Gets a user by their ID.
    ///
    /// # Returns
    /// The user if found, or `NotFound` error
    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", "id", id))
    }

    pub async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        self.repo.find_by_id(id).await
    }

    pub async fn update_profile(&self, id: Uuid, name: String) -> AppResult<User> {
        self.get_user(id).await?;

        let changes = UpdateUser {
            name: Some(name),
            ..UpdateUser::default()
        };
        self.repo.update(id, changes).await
    }

    pub async fn update_password(&self, id: Uuid, password: &str) -> AppResult<User> {
        self.get_user(id).await?;

        let changes = UpdateUser {
            password: Some(hash_password(password)?),
            ..UpdateUser::default()
        };
        self.repo.update(id, changes).await
    }

    /// Stores a new avatar for `user`, replacing the previous file.
    ///
    /// # Errors
    /// `NotAcceptable` when the extension is not jpg, jpeg or png
    pub async fn upload_avatar(&self, user: &User, filename: &str, bytes: &[u8]) -> AppResult<User> {
        if !Storage::verify_extension(filename) {
            return Err(AppError::NotAcceptable {
                message: INVALID_FILE_TYPE_MESSAGE.to_string(),
            });
        }

        let stored_name = Storage::generate_filename(filename);

        if user.has_avatar() {
            self.storage.delete(StorageFolder::Users, &user.avatar).await?;
        }
        self.storage
            .save(StorageFolder::Users, &stored_name, bytes)
            .await?;

        let changes = UpdateUser {
            avatar: Some(stored_name),
            ..UpdateUser::default()
        };
        self.repo.update(user.id, changes).await
    }

    /// Loads the avatar file of `user`
    pub async fn avatar(&self, user: &User) -> AppResult<StoredFile> {
        let not_found = || AppError::not_found("Avatar", "user_id", user.id);

        if !user.has_avatar() {
            return Err(not_found());
        }

        self.storage
            .load(StorageFolder::Users, &user.avatar)
            .await?
            .ok_or_else(not_found)
    }
}
