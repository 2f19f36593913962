// src/services/analytics_service.rs

use crate::{
    common::error::AppError,
    db::AnalyticsRepository,
    models::analytics::{pareto, CausaPareto, ManutentorStats, MaquinaStats, PeriodoFilter, Resumo},
};

#[derive(Clone)]
pub struct AnalyticsService {
    analytics_repo: AnalyticsRepository,
}

impl AnalyticsService {
    pub fn new(analytics_repo: AnalyticsRepository) -> Self {
        Self { analytics_repo }
    }

    pub async fn summary(&self, periodo: &PeriodoFilter) -> Result<Resumo, AppError> {
        periodo.check()?;
        self.analytics_repo.get_summary(periodo).await
    }

    pub async fn by_machine(&self, periodo: &PeriodoFilter) -> Result<Vec<MaquinaStats>, AppError> {
        periodo.check()?;
        self.analytics_repo.get_by_machine(periodo).await
    }

    pub async fn root_cause_pareto(&self, periodo: &PeriodoFilter) -> Result<Vec<CausaPareto>, AppError> {
        periodo.check()?;
        let contagens = self.analytics_repo.count_causes(periodo).await?;
        Ok(pareto(contagens))
    }

    pub async fn by_maintainer(&self, periodo: &PeriodoFilter) -> Result<Vec<ManutentorStats>, AppError> {
        periodo.check()?;
        self.analytics_repo.get_by_maintainer(periodo).await
    }
}
