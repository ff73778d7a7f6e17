use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        ChangePasswordRequest, Claims, LoginRequest, LoginResponse, RegisterRequest,
        UpdateProfileRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User, UserProfile},
    response::{ApiResponse, Meta},
    state::AppState,
    store::{keys, load_list, load_record, save_list, save_record},
};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@store.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

const TOKEN_TTL_HOURS: i64 = 24;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let RegisterRequest {
        email,
        password,
        name,
    } = payload;
    let email = email.trim().to_string();
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("Password must not be empty".into()));
    }
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".into()));
    }

    let password_hash = hash_password(&password)?;
    let user = {
        let _gate = state.write_gate.lock().await;
        let mut users = load_users(state).await?;
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::BadRequest("Email is already taken".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email,
            name: name.trim().to_string(),
            role: Role::Customer,
            phone: None,
            password_hash,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        save_list(state.store.as_ref(), keys::USERS, &users).await?;
        user
    };

    let resp = start_session(state, &user).await?;

    log_audit(
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    );

    Ok(ApiResponse::success("User created", resp, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim();
    let user = load_users(state)
        .await?
        .into_iter()
        .find(|u| u.email == email);

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    if !verify_password(&user.password_hash, &password)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let resp = start_session(state, &user).await?;

    log_audit(
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id, "role": user.role.as_str() })),
    );

    Ok(ApiResponse::success(
        "Logged in",
        resp,
        Some(Meta::empty()),
    ))
}

/// Drop the stored session record if it belongs to `user`.
pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    {
        let _gate = state.write_gate.lock().await;
        if current_user(state)
            .await?
            .is_some_and(|session| session.id == user.user_id)
        {
            state.store.remove(keys::CURRENT_USER).await?;
        }
    }

    log_audit(Some(user.user_id), "user_logout", Some("users"), None);

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let profile = load_users(state)
        .await?
        .into_iter()
        .find(|u| u.id == user.user_id)
        .map(|u| u.profile())
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;
    Ok(ApiResponse::success("Profile", profile, Some(Meta::empty())))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.new_password.is_empty() {
        return Err(AppError::BadRequest("Password must not be empty".into()));
    }

    // Hashing happens before the gate is taken; the gate only guards the swap.
    let verified_hash = load_users(state)
        .await?
        .into_iter()
        .find(|u| u.id == user.user_id)
        .map(|u| u.password_hash)
        .ok_or(AppError::NotFound)?;
    if !verify_password(&verified_hash, &payload.current_password)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    let new_hash = hash_password(&payload.new_password)?;

    {
        let _gate = state.write_gate.lock().await;
        let mut users = load_users(state).await?;
        let record = users
            .iter_mut()
            .find(|u| u.id == user.user_id)
            .ok_or(AppError::NotFound)?;
        // A concurrent change invalidated the password we checked.
        if record.password_hash != verified_hash {
            return Err(AppError::BadRequest("Current password is incorrect".into()));
        }
        record.password_hash = new_hash;
        save_list(state.store.as_ref(), keys::USERS, &users).await?;
    }

    log_audit(Some(user.user_id), "password_change", Some("users"), None);

    Ok(ApiResponse::success(
        "Password changed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("Name must not be empty".into()));
    }

    let profile = {
        let _gate = state.write_gate.lock().await;
        let mut users = load_users(state).await?;

        if let Some(email) = payload.email.as_deref().map(str::trim) {
            if !email.contains('@') {
                return Err(AppError::BadRequest("Invalid email address".into()));
            }
            if users.iter().any(|u| u.email == email && u.id != user.user_id) {
                return Err(AppError::BadRequest("Email already exists".into()));
            }
        }

        let record = users
            .iter_mut()
            .find(|u| u.id == user.user_id)
            .ok_or(AppError::NotFound)?;
        if let Some(name) = payload.name {
            record.name = name.trim().to_string();
        }
        if let Some(email) = payload.email {
            record.email = email.trim().to_string();
        }
        if let Some(phone) = payload.phone {
            record.phone = Some(phone.trim().to_string()).filter(|p| !p.is_empty());
        }
        let profile = record.profile();
        save_list(state.store.as_ref(), keys::USERS, &users).await?;

        if current_user(state)
            .await?
            .is_some_and(|session| session.id == profile.id)
        {
            save_record(state.store.as_ref(), keys::CURRENT_USER, &profile).await?;
        }
        profile
    };

    log_audit(
        Some(user.user_id),
        "profile_update",
        Some("users"),
        Some(serde_json::json!({ "user_id": profile.id })),
    );

    Ok(ApiResponse::success(
        "Profile updated",
        profile,
        Some(Meta::empty()),
    ))
}

/// Create the built-in administrator account when it does not exist yet.
pub async fn ensure_default_admin(state: &AppState) -> AppResult<Uuid> {
    let _gate = state.write_gate.lock().await;
    let mut users = load_users(state).await?;
    if let Some(admin) = users.iter().find(|u| u.email == DEFAULT_ADMIN_EMAIL) {
        return Ok(admin.id);
    }

    let admin = User {
        id: Uuid::new_v4(),
        email: DEFAULT_ADMIN_EMAIL.to_string(),
        name: "Store Administrator".to_string(),
        role: Role::Admin,
        phone: Some("+977 98765 43210".to_string()),
        password_hash: hash_password(DEFAULT_ADMIN_PASSWORD)?,
        created_at: Utc::now(),
    };
    let id = admin.id;
    users.push(admin);
    save_list(state.store.as_ref(), keys::USERS, &users).await?;
    tracing::info!(user_id = %id, email = DEFAULT_ADMIN_EMAIL, "created default admin");
    Ok(id)
}

/// The most recent session record, if any.
pub async fn current_user(state: &AppState) -> AppResult<Option<UserProfile>> {
    Ok(load_record(state.store.as_ref(), keys::CURRENT_USER).await?)
}

pub(crate) async fn load_users(state: &AppState) -> AppResult<Vec<User>> {
    Ok(load_list(state.store.as_ref(), keys::USERS).await?)
}

async fn start_session(state: &AppState, user: &User) -> AppResult<LoginResponse> {
    let token = issue_token(&state.config.jwt_secret, user)?;
    let profile = user.profile();
    save_record(state.store.as_ref(), keys::CURRENT_USER, &profile).await?;
    Ok(LoginResponse {
        token: format!("Bearer {}", token),
        user: profile,
    })
}

fn issue_token(secret: &str, user: &User) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
