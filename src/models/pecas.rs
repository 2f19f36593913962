// src/models/pecas.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Peca {
    pub id: Uuid,
    #[schema(example = "ROL-6204")]
    pub codigo: String,
    #[schema(example = "Rolamento 6204 2RS")]
    pub nome: String,
    #[schema(value_type = f64, example = 12.0)]
    pub quantidade: Decimal,
    #[schema(value_type = f64, example = 4.0)]
    pub estoque_minimo: Decimal,
    #[schema(value_type = f64, example = 35.90)]
    pub custo_unitario: Decimal,
    #[schema(example = "Almoxarifado A - Prateleira 3")]
    pub localizacao: Option<String>,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

impl Peca {
    pub fn estoque_baixo(&self) -> bool {
        self.quantidade <= self.estoque_minimo
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movimentacao_tipo", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum MovimentacaoTipo {
    Entrada,
    Saida,
    /// Inventário: a quantidade informada passa a ser o saldo
    Ajuste,
}

// Quantidades e saldos são NUMERIC(14,3); custos, NUMERIC(14,2)
const PRECISAO: u32 = 14;
const CASAS_QUANTIDADE: u32 = 3;
const CASAS_CUSTO: u32 = 2;

/// Não negativo e representável na coluna sem arredondar.
fn cabe_na_coluna(valor: Decimal, casas: u32) -> bool {
    let limite = Decimal::from(10i64.pow(PRECISAO - casas));
    !valor.is_sign_negative() && valor.normalize().scale() <= casas && valor < limite
}

pub fn quantidade_valida(valor: Decimal) -> bool {
    cabe_na_coluna(valor, CASAS_QUANTIDADE)
}

pub fn custo_valido(valor: Decimal) -> bool {
    cabe_na_coluna(valor, CASAS_CUSTO)
}

/// Saldo após a movimentação. Saídas que deixariam o estoque negativo são recusadas.
pub fn apply_movement(
    atual: Decimal,
    tipo: MovimentacaoTipo,
    quantidade: Decimal,
) -> Result<Decimal, AppError> {
    // Ajuste aceita zero (zerar o estoque); entrada e saída precisam de quantidade positiva
    let zero_invalido = tipo != MovimentacaoTipo::Ajuste && quantidade.is_zero();
    if zero_invalido || !quantidade_valida(quantidade) {
        return Err(AppError::InvalidQuantity);
    }

    match tipo {
        MovimentacaoTipo::Entrada => {
            let saldo = atual + quantidade;
            if !quantidade_valida(saldo) {
                return Err(AppError::InvalidQuantity);
            }
            Ok(saldo)
        }
        MovimentacaoTipo::Saida => {
            if quantidade > atual {
                return Err(AppError::InsufficientStock(atual));
            }
            Ok(atual - quantidade)
        }
        MovimentacaoTipo::Ajuste => Ok(quantidade),
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movimentacao {
    pub id: Uuid,
    pub peca_id: Uuid,
    pub chamado_id: Option<Uuid>,
    pub tipo: MovimentacaoTipo,
    #[schema(value_type = f64)]
    pub quantidade: Decimal,
    #[schema(value_type = f64)]
    pub saldo_apos: Decimal,
    pub usuario_id: Option<Uuid>,
    pub observacao: Option<String>,
    pub criado_em: DateTime<Utc>,
}

/// O que uma movimentação precisa para ser registrada (vinda da API ou de um chamado).
#[derive(Debug, Clone)]
pub struct NovaMovimentacao {
    pub tipo: MovimentacaoTipo,
    pub quantidade: Decimal,
    pub chamado_id: Option<Uuid>,
    pub usuario_id: Option<Uuid>,
    pub observacao: Option<String>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePecaPayload {
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub codigo: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub quantidade: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub estoque_minimo: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub custo_unitario: Decimal,
    pub localizacao: Option<String>,
}

impl CreatePecaPayload {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        if !quantidade_valida(self.quantidade)
            || !quantidade_valida(self.estoque_minimo)
            || !custo_valido(self.custo_unitario)
        {
            return Err(AppError::InvalidQuantity);
        }
        Ok(())
    }
}

/// Só metadados: a quantidade muda apenas por movimentações.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePecaPayload {
    #[validate(length(min = 1, message = "O código não pode ser vazio."))]
    pub codigo: Option<String>,
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub nome: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub estoque_minimo: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub custo_unitario: Option<Decimal>,
    pub localizacao: Option<String>,
}

impl UpdatePecaPayload {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        let minimo_ok = self.estoque_minimo.is_none_or(quantidade_valida);
        let custo_ok = self.custo_unitario.is_none_or(custo_valido);
        if !(minimo_ok && custo_ok) {
            return Err(AppError::InvalidQuantity);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovimentacaoPayload {
    pub tipo: MovimentacaoTipo,
    #[schema(value_type = f64, example = 5.0)]
    pub quantidade: Decimal,
    pub observacao: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entrada_adds_and_ajuste_overwrites() {
        let atual = Decimal::from(10);
        assert_eq!(
            apply_movement(atual, MovimentacaoTipo::Entrada, Decimal::from(5)).unwrap(),
            Decimal::from(15)
        );
        assert_eq!(
            apply_movement(atual, MovimentacaoTipo::Ajuste, Decimal::from(3)).unwrap(),
            Decimal::from(3)
        );
    }

    #[test]
    fn saida_cannot_go_negative() {
        let atual = Decimal::from(2);
        assert_eq!(
            apply_movement(atual, MovimentacaoTipo::Saida, Decimal::from(2)).unwrap(),
            Decimal::ZERO
        );
        match apply_movement(atual, MovimentacaoTipo::Saida, Decimal::from(3)) {
            Err(AppError::InsufficientStock(disponivel)) => assert_eq!(disponivel, atual),
            other => panic!("esperava estoque insuficiente, veio {:?}", other),
        }
    }

    #[test]
    fn zero_or_negative_quantities_are_rejected() {
        let atual = Decimal::from(5);
        assert!(matches!(
            apply_movement(atual, MovimentacaoTipo::Entrada, Decimal::ZERO),
            Err(AppError::InvalidQuantity)
        ));
        assert!(matches!(
            apply_movement(atual, MovimentacaoTipo::Saida, Decimal::from(-1)),
            Err(AppError::InvalidQuantity)
        ));
        assert_eq!(
            apply_movement(atual, MovimentacaoTipo::Ajuste, Decimal::ZERO).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn quantities_finer_than_the_column_are_rejected() {
        let atual = Decimal::from(5);
        // 0.0004 seria gravado como zero
        let fina = Decimal::new(4, 4);
        assert!(matches!(
            apply_movement(atual, MovimentacaoTipo::Entrada, fina),
            Err(AppError::InvalidQuantity)
        ));
        // zeros à direita não contam como casas
        assert_eq!(
            apply_movement(atual, MovimentacaoTipo::Saida, Decimal::new(15000, 4)).unwrap(),
            Decimal::new(35, 1)
        );
    }

    #[test]
    fn quantities_beyond_the_column_range_are_rejected() {
        let enorme = Decimal::from(100_000_000_000i64);
        assert!(matches!(
            apply_movement(Decimal::ZERO, MovimentacaoTipo::Ajuste, enorme),
            Err(AppError::InvalidQuantity)
        ));
        // o saldo resultante também precisa caber
        let quase = Decimal::new(99_999_999_999_999, 3);
        assert!(matches!(
            apply_movement(quase, MovimentacaoTipo::Entrada, Decimal::ONE),
            Err(AppError::InvalidQuantity)
        ));
        assert!(quantidade_valida(quase));
    }

    #[test]
    fn payload_amounts_follow_the_column_limits() {
        let payload = CreatePecaPayload {
            codigo: "ROL-6204".into(),
            nome: "Rolamento".into(),
            quantidade: Decimal::new(1, 3),
            estoque_minimo: Decimal::ZERO,
            custo_unitario: Decimal::new(3599, 3),
            localizacao: None,
        };
        assert!(matches!(payload.check_amounts(), Err(AppError::InvalidQuantity)));

        let update = UpdatePecaPayload {
            codigo: None,
            nome: None,
            estoque_minimo: Some(Decimal::new(-1, 0)),
            custo_unitario: None,
            localizacao: None,
        };
        assert!(matches!(update.check_amounts(), Err(AppError::InvalidQuantity)));
    }

    #[test]
    fn low_stock_includes_the_minimum() {
        let peca = Peca {
            id: Uuid::new_v4(),
            codigo: "X".into(),
            nome: "Correia".into(),
            quantidade: Decimal::from(4),
            estoque_minimo: Decimal::from(4),
            custo_unitario: Decimal::ZERO,
            localizacao: None,
            criado_em: Utc::now(),
            atualizado_em: Utc::now(),
        };
        assert!(peca.estoque_baixo());
    }
}
