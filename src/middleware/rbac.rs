// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use std::marker::PhantomData;

use crate::{
    common::{error::{ApiError, AppError}, i18n::I18nStore},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Role,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. A matriz de permissões por perfil (fixa no código, não vem do banco)
pub fn role_permissions(role: Role) -> &'static [&'static str] {
    const OPERADOR: &[&str] = &["chamados:abrir", "checklists:enviar"];
    const MANUTENTOR: &[&str] = &[
        "chamados:abrir",
        "chamados:atender",
        "checklists:enviar",
        "pecas:movimentar",
    ];
    const GESTOR: &[&str] = &[
        "chamados:abrir",
        "chamados:atender",
        "chamados:gerir",
        "checklists:enviar",
        "maquinas:gerir",
        "agenda:gerir",
        "planos:gerir",
        "pecas:movimentar",
        "pecas:gerir",
        "causas:gerir",
        "analytics:ler",
    ];
    const ADMIN: &[&str] = &[
        "chamados:abrir",
        "chamados:atender",
        "chamados:gerir",
        "checklists:enviar",
        "maquinas:gerir",
        "agenda:gerir",
        "planos:gerir",
        "pecas:movimentar",
        "pecas:gerir",
        "causas:gerir",
        "analytics:ler",
        "usuarios:gerir",
    ];

    match role {
        Role::Operador => OPERADOR,
        Role::Manutentor => MANUTENTOR,
        Role::Gestor => GESTOR,
        Role::Admin => ADMIN,
    }
}

pub fn role_has_permission(role: Role, slug: &str) -> bool {
    role_permissions(role).contains(&slug)
}

/// 3. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        // A. Extrai Usuário (colocado lá pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(ApiError {
                status: StatusCode::UNAUTHORIZED,
                error: "Usuário não autenticado".into(),
                details: None,
            })?;

        // B. Verifica a permissão do perfil
        check_permission::<T>(user.0.role, &locale, &app_state.i18n_store)?;

        Ok(RequirePermission(PhantomData))
    }
}

fn check_permission<T: PermissionDef>(
    role: Role,
    locale: &Locale,
    store: &I18nStore,
) -> Result<(), ApiError> {
    let required_perm = T::slug();
    if !role_has_permission(role, required_perm) {
        tracing::debug!(?role, required_perm, "Acesso negado");
        return Err(AppError::Forbidden(required_perm.to_string()).to_api_error(locale, store));
    }
    Ok(())
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $slug:literal) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn slug() -> &'static str {
                $slug
            }
        }
    };
}

permission!(PermChamadosAbrir, "chamados:abrir");
permission!(PermChamadosAtender, "chamados:atender");
permission!(PermChamadosGerir, "chamados:gerir");
permission!(PermChecklistsEnviar, "checklists:enviar");
permission!(PermMaquinasGerir, "maquinas:gerir");
permission!(PermAgendaGerir, "agenda:gerir");
permission!(PermPlanosGerir, "planos:gerir");
permission!(PermPecasMovimentar, "pecas:movimentar");
permission!(PermPecasGerir, "pecas:gerir");
permission!(PermCausasGerir, "causas:gerir");
permission!(PermAnalyticsLer, "analytics:ler");
permission!(PermUsuariosGerir, "usuarios:gerir");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_only_open_tickets_and_send_checklists() {
        assert!(role_has_permission(Role::Operador, PermChamadosAbrir::slug()));
        assert!(role_has_permission(Role::Operador, PermChecklistsEnviar::slug()));
        assert!(!role_has_permission(Role::Operador, PermChamadosAtender::slug()));
        assert!(!role_has_permission(Role::Operador, PermAnalyticsLer::slug()));
    }

    #[test]
    fn maintainers_attend_tickets_but_do_not_manage() {
        assert!(role_has_permission(Role::Manutentor, PermChamadosAtender::slug()));
        assert!(role_has_permission(Role::Manutentor, PermPecasMovimentar::slug()));
        assert!(!role_has_permission(Role::Manutentor, PermAgendaGerir::slug()));
        assert!(!role_has_permission(Role::Manutentor, PermPecasGerir::slug()));
    }

    #[test]
    fn only_admins_manage_users() {
        assert!(!role_has_permission(Role::Gestor, PermUsuariosGerir::slug()));
        assert!(role_has_permission(Role::Admin, PermUsuariosGerir::slug()));
    }

    #[test]
    fn admin_has_every_manager_permission() {
        for slug in role_permissions(Role::Gestor) {
            assert!(role_has_permission(Role::Admin, slug), "admin sem {}", slug);
        }
    }

    #[test]
    fn denied_permission_is_a_localized_403() {
        let store = I18nStore::load().unwrap();
        let err = check_permission::<PermMaquinasGerir>(
            Role::Operador,
            &Locale("pt".into()),
            &store,
        )
        .unwrap_err();

        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.error.contains("maquinas:gerir"));
    }
}
