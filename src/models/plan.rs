use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Account roles as the identity provider spells them on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum UserRole {
    #[serde(rename = "Administrador")]
    Administrator,
    #[serde(rename = "Executivo de Vendas")]
    SalesExecutive,
    #[serde(rename = "Foco da Unidade")]
    FocusUnit,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Administrator => "Administrador",
            UserRole::SalesExecutive => "Executivo de Vendas",
            UserRole::FocusUnit => "Foco da Unidade",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Administrador" => Ok(UserRole::Administrator),
            "Executivo de Vendas" => Ok(UserRole::SalesExecutive),
            "Foco da Unidade" => Ok(UserRole::FocusUnit),
            other => Err(AppError::InvalidRoleError(format!(
                "unrecognized role: {other}"
            ))),
        }
    }
}

/// Monthly plan sold to a billable role. Prices are BRL cents; the gateway
/// boundary converts to the decimal amounts its API expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub name: &'static str,
    pub amount_cents: i64,
    pub trial_period_days: i64,
}

impl Plan {
    /// Plan for a role. Administrators never subscribe, so asking for their
    /// plan is a caller error.
    pub fn for_role(role: UserRole) -> AppResult<Plan> {
        match role {
            UserRole::SalesExecutive => Ok(Plan {
                name: "Plano Executivo",
                amount_cents: 1500,
                trial_period_days: 7,
            }),
            UserRole::FocusUnit => Ok(Plan {
                name: "Plano Foco da Unidade",
                amount_cents: 2000,
                trial_period_days: 7,
            }),
            UserRole::Administrator => Err(AppError::InvalidRoleError(
                "administrators do not require a subscription".to_string(),
            )),
        }
    }

    pub fn amount_brl(&self) -> f64 {
        self.amount_cents as f64 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_for_billable_roles() {
        let executive = Plan::for_role(UserRole::SalesExecutive).unwrap();
        assert_eq!(executive.name, "Plano Executivo");
        assert_eq!(executive.amount_cents, 1500);
        assert_eq!(executive.trial_period_days, 7);

        let focus = Plan::for_role(UserRole::FocusUnit).unwrap();
        assert_eq!(focus.name, "Plano Foco da Unidade");
        assert_eq!(focus.amount_cents, 2000);
        assert_eq!(focus.trial_period_days, 7);
    }

    #[test]
    fn test_plan_rejects_administrator() {
        assert!(matches!(
            Plan::for_role(UserRole::Administrator),
            Err(AppError::InvalidRoleError(_))
        ));
    }

    #[test]
    fn test_amount_brl() {
        let plan = Plan::for_role(UserRole::SalesExecutive).unwrap();
        assert_eq!(plan.amount_brl(), 15.0);
    }

    #[test]
    fn test_role_wire_values_round_trip() {
        for role in [
            UserRole::Administrator,
            UserRole::SalesExecutive,
            UserRole::FocusUnit,
        ] {
            let parsed: UserRole = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("Gerente".parse::<UserRole>().is_err());
    }
}
