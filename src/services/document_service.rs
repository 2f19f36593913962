// src/services/document_service.rs

use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    db::ChamadoRepository,
    models::chamados::{Chamado, ChamadoTipo},
};

const FONT_FAMILY: &str = "Roboto";

#[derive(Clone)]
pub struct DocumentService {
    chamado_repo: ChamadoRepository,
    fonts_dir: String,
}

impl DocumentService {
    pub fn new(chamado_repo: ChamadoRepository, fonts_dir: String) -> Self {
        Self { chamado_repo, fonts_dir }
    }

    /// Ordem de serviço de um chamado (a visibilidade já foi checada por quem chama).
    pub async fn generate_chamado_pdf(&self, chamado: Chamado) -> Result<Vec<u8>, AppError> {
        let fonts_dir = self.fonts_dir.clone();
        render_blocking(move || render_chamado(&fonts_dir, &chamado)).await
    }

    /// Relatório tabular dos chamados abertos no período.
    pub async fn generate_period_pdf(
        &self,
        desde: Option<NaiveDate>,
        ate: Option<NaiveDate>,
    ) -> Result<Vec<u8>, AppError> {
        if let (Some(d), Some(a)) = (desde, ate) {
            if a < d {
                return Err(AppError::InvalidPeriod);
            }
        }

        let chamados = self.chamado_repo.list_period(desde, ate).await?;
        tracing::debug!(total = chamados.len(), "Gerando relatório de chamados");

        let fonts_dir = self.fonts_dir.clone();
        render_blocking(move || render_period(&fonts_dir, desde, ate, &chamados)).await
    }
}

// A montagem do PDF é CPU-bound: roda fora do runtime assíncrono.
async fn render_blocking<F>(job: F) -> Result<Vec<u8>, AppError>
where
    F: FnOnce() -> Result<Vec<u8>, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de geração do PDF: {}", e))?
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Erro ao gerar PDF: {}", e))
}

/// Cria o documento com a fonte do diretório configurado.
fn new_document(fonts_dir: &str, title: &str) -> Result<genpdf::Document, AppError> {
    if !Path::new(fonts_dir).is_dir() {
        return Err(AppError::FontNotFound(fonts_dir.to_string()));
    }
    let font_family = genpdf::fonts::from_files(fonts_dir, FONT_FAMILY, None)
        .map_err(|_| AppError::FontNotFound(fonts_dir.to_string()))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(title);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

fn render(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

fn tipo_label(tipo: ChamadoTipo) -> &'static str {
    match tipo {
        ChamadoTipo::Corretiva => "Corretiva",
        ChamadoTipo::Preventiva => "Preventiva",
        ChamadoTipo::Preditiva => "Preditiva",
    }
}

fn data_hora(valor: DateTime<Utc>) -> String {
    valor.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()
}

fn render_chamado(fonts_dir: &str, chamado: &Chamado) -> Result<Vec<u8>, AppError> {
    let mut doc = new_document(fonts_dir, &format!("Chamado #{}", chamado.numero))?;
    let bold = style::Style::new().bold();

    // --- CABEÇALHO ---
    doc.push(
        elements::Paragraph::new(format!("ORDEM DE SERVIÇO - CHAMADO #{}", chamado.numero))
            .styled(style::Style::new().bold().with_font_size(16)),
    );
    doc.push(elements::Break::new(1));

    let mut resumo = elements::TableLayout::new(vec![1, 3]);
    resumo.set_cell_decorator(elements::FrameCellDecorator::new(false, false, false));
    let linhas = [
        ("Máquina", chamado.maquina.clone()),
        ("Tipo", tipo_label(chamado.tipo).to_string()),
        ("Status", chamado.status.label().to_string()),
        ("Aberto por", chamado.operador_nome.clone()),
        ("Aberto em", data_hora(chamado.criado_em)),
        ("Manutentor", chamado.manutentor_nome.clone().unwrap_or_else(|| "-".into())),
        ("Concluído em", chamado.concluido_em.map(data_hora).unwrap_or_else(|| "-".into())),
    ];
    for (rotulo, valor) in linhas {
        resumo
            .row()
            .element(elements::Paragraph::new(rotulo).styled(bold))
            .element(elements::Paragraph::new(valor))
            .push()
            .map_err(pdf_error)?;
    }
    doc.push(resumo);
    doc.push(elements::Break::new(1.5));

    // --- PROBLEMA E SOLUÇÃO ---
    doc.push(elements::Paragraph::new("Descrição").styled(bold));
    doc.push(elements::Paragraph::new(chamado.descricao.clone()));
    doc.push(elements::Break::new(1));

    if let Some(causa) = &chamado.causa {
        doc.push(elements::Paragraph::new(format!("Causa raiz: {}", causa)).styled(bold));
    }
    if let Some(solucao) = &chamado.solucao {
        doc.push(elements::Paragraph::new("Solução").styled(bold));
        doc.push(elements::Paragraph::new(solucao.clone()));
    }

    // --- CHECKLIST ---
    if !chamado.checklist.is_empty() {
        doc.push(elements::Break::new(1.5));
        doc.push(elements::Paragraph::new("Checklist").styled(bold));

        let mut table = elements::TableLayout::new(vec![5, 1]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        for item in &chamado.checklist {
            table
                .row()
                .element(elements::Paragraph::new(item.item.clone()))
                .element(elements::Paragraph::new(if item.concluido { "OK" } else { "-" }))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);
    }

    // --- OBSERVAÇÕES ---
    if !chamado.observacoes.is_empty() {
        doc.push(elements::Break::new(1.5));
        doc.push(elements::Paragraph::new("Observações").styled(bold));
        for obs in &chamado.observacoes {
            doc.push(
                elements::Paragraph::new(format!(
                    "{} ({}): {}",
                    obs.autor_nome,
                    data_hora(obs.criado_em),
                    obs.texto
                ))
                .styled(style::Style::new().with_font_size(9)),
            );
        }
    }

    // --- QR CODE (identifica o chamado no sistema) ---
    doc.push(elements::Break::new(2));
    let code = QrCode::new(format!("chamado:{}", chamado.id).as_bytes()).map_err(pdf_error)?;
    let image_buffer = code.render::<Luma<u8>>().build();
    let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
    let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
        .map_err(pdf_error)?
        .with_scale(genpdf::Scale::new(0.4, 0.4));
    doc.push(pdf_image);

    render(doc)
}

fn render_period(
    fonts_dir: &str,
    desde: Option<NaiveDate>,
    ate: Option<NaiveDate>,
    chamados: &[Chamado],
) -> Result<Vec<u8>, AppError> {
    let mut doc = new_document(fonts_dir, "Relatório de chamados")?;
    let bold = style::Style::new().bold();

    doc.push(
        elements::Paragraph::new("RELATÓRIO DE CHAMADOS")
            .styled(style::Style::new().bold().with_font_size(16)),
    );
    let fmt = |d: Option<NaiveDate>| d.map(|d| d.format("%d/%m/%Y").to_string());
    let periodo = match (fmt(desde), fmt(ate)) {
        (Some(d), Some(a)) => format!("Período: {} a {}", d, a),
        (Some(d), None) => format!("A partir de {}", d),
        (None, Some(a)) => format!("Até {}", a),
        (None, None) => "Todos os chamados".to_string(),
    };
    doc.push(elements::Paragraph::new(periodo));
    doc.push(elements::Paragraph::new(format!("Total: {} chamado(s)", chamados.len())));
    doc.push(elements::Break::new(1.5));

    // Pesos das colunas: Nº (1), Abertura (2), Máquina (3), Tipo (2), Status (2), Manutentor (3)
    let mut table = elements::TableLayout::new(vec![1, 2, 3, 2, 2, 3]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    table
        .row()
        .element(elements::Paragraph::new("Nº").styled(bold))
        .element(elements::Paragraph::new("Abertura").styled(bold))
        .element(elements::Paragraph::new("Máquina").styled(bold))
        .element(elements::Paragraph::new("Tipo").styled(bold))
        .element(elements::Paragraph::new("Status").styled(bold))
        .element(elements::Paragraph::new("Manutentor").styled(bold))
        .push()
        .map_err(pdf_error)?;

    for c in chamados {
        table
            .row()
            .element(elements::Paragraph::new(c.numero.to_string()))
            .element(elements::Paragraph::new(data_hora(c.criado_em)))
            .element(elements::Paragraph::new(c.maquina.clone()))
            .element(elements::Paragraph::new(tipo_label(c.tipo)))
            .element(elements::Paragraph::new(c.status.label()))
            .element(elements::Paragraph::new(c.manutentor_nome.clone().unwrap_or_else(|| "-".into())))
            .push()
            .map_err(pdf_error)?;
    }
    doc.push(table);

    render(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fonts_dir_is_reported() {
        let result = new_document("/caminho/que/nao/existe", "teste");
        match result {
            Err(AppError::FontNotFound(dir)) => assert_eq!(dir, "/caminho/que/nao/existe"),
            Err(other) => panic!("esperava FontNotFound, veio {:?}", other),
            Ok(_) => panic!("não deveria criar o documento sem fontes"),
        }
    }

    #[test]
    fn dir_without_the_font_files_is_reported() {
        let dir = std::env::temp_dir();
        let result = new_document(dir.to_str().unwrap(), "teste");
        assert!(matches!(result, Err(AppError::FontNotFound(_))));
    }
}
