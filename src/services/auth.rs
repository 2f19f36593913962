// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AdminBootstrap,
    db::UserRepository,
    models::auth::{Claims, Role, Usuario},
    services::event_bus::{EventBus, Topic},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    expiration_days: i64,
    events: EventBus,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        jwt_secret: String,
        expiration_days: i64,
        events: EventBus,
    ) -> Self {
        Self { user_repo, jwt_secret, expiration_days, events }
    }

    pub async fn login_user(&self, email: &str, senha: &str) -> Result<(String, Usuario), AppError> {
        let usuario = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let senha_clone = senha.to_owned();
        let hash_clone = usuario.senha_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&senha_clone, &hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }
        if !usuario.ativo {
            return Err(AppError::InactiveUser);
        }

        tracing::info!(usuario_id = %usuario.id, "Login realizado");
        let token = self.create_token(usuario.id)?;
        Ok((token, usuario))
    }

    pub async fn validate_token(&self, token: &str) -> Result<Usuario, AppError> {
        let user_id = self.decode_token(token)?;

        let usuario = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !usuario.ativo {
            return Err(AppError::InactiveUser);
        }
        Ok(usuario)
    }

    /// Valida assinatura e expiração, devolvendo o ID do usuário (`sub`).
    pub fn decode_token(&self, token: &str) -> Result<Uuid, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims.sub)
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.expiration_days);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    // --- GESTÃO DE USUÁRIOS ---

    pub async fn create_user(
        &self,
        nome: &str,
        email: &str,
        senha: &str,
        role: Role,
    ) -> Result<Usuario, AppError> {
        let senha_hash = hash_password(senha).await?;
        let usuario = self.user_repo.create_user(nome, email, &senha_hash, role).await?;

        tracing::info!(usuario_id = %usuario.id, ?role, "Usuário criado");
        self.events.publish(Topic::Usuarios);
        Ok(usuario)
    }

    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<Usuario>, AppError> {
        self.user_repo.list(role).await
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        nome: Option<&str>,
        role: Option<Role>,
        ativo: Option<bool>,
    ) -> Result<Usuario, AppError> {
        let usuario = self.user_repo.update_user(id, nome, role, ativo).await?;
        self.events.publish(Topic::Usuarios);
        Ok(usuario)
    }

    /// Cria o primeiro administrador quando ainda não existe nenhum.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> Result<(), AppError> {
        if self.user_repo.count_admins().await? > 0 {
            return Ok(());
        }

        match self.create_user(&admin.nome, &admin.email, &admin.senha, Role::Admin).await {
            Ok(_) => {
                tracing::info!("👤 Administrador inicial '{}' criado", admin.email);
                Ok(())
            }
            Err(AppError::EmailAlreadyExists) => {
                tracing::warn!(
                    "Já existe um usuário com o e-mail {}, mas ele não é administrador",
                    admin.email
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

// Hashing em thread separado (bcrypt é CPU-bound)
async fn hash_password(senha: &str) -> Result<String, AppError> {
    let senha_clone = senha.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&senha_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str, days: i64) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/chamados_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool), secret.to_string(), days, EventBus::new())
    }

    #[tokio::test]
    async fn token_round_trip_returns_the_subject() {
        let auth = service("segredo", 7);
        let id = Uuid::new_v4();

        let token = auth.create_token(id).unwrap();

        assert_eq!(auth.decode_token(&token).unwrap(), id);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("segredo-a", 7).create_token(Uuid::new_v4()).unwrap();

        let result = service("segredo-b", 7).decode_token(&token);

        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let auth = service("segredo", -2);
        let token = auth.create_token(Uuid::new_v4()).unwrap();

        assert!(matches!(auth.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify("segredo123", &hashed).unwrap());
        assert!(!verify("outra", &hashed).unwrap());
    }
}
