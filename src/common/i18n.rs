// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

/// Idioma usado quando o cliente não pede nenhum (ou pede um que não temos).
pub const DEFAULT_LANG: &str = "pt";

// Catálogos de mensagens de erro, indexados por idioma e depois por chave.
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    /// Carrega os catálogos embutidos no binário (pasta `locales/`).
    pub fn load() -> anyhow::Result<Self> {
        let mut store = Self::default();
        store.add_catalog("pt", include_str!("../../locales/pt.json"))?;
        store.add_catalog("en", include_str!("../../locales/en.json"))?;
        Ok(store)
    }

    pub fn add_catalog(&mut self, lang: &str, json: &str) -> anyhow::Result<()> {
        let messages: HashMap<String, String> = serde_json::from_str(json)
            .with_context(|| format!("Catálogo de idioma '{}' inválido", lang))?;
        self.catalogs.insert(lang.to_string(), messages);
        Ok(())
    }

    /// Traduz `key`, substituindo `{nome}` pelos argumentos.
    /// Cai no idioma padrão e, por último, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|catalog| catalog.get(key)));

        let Some(template) = template else {
            return key.to_string();
        };

        args.iter().fold(template.clone(), |message, (name, value)| {
            message.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalogs_have_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let pt = store.catalogs.get("pt").unwrap();
        let en = store.catalogs.get("en").unwrap();

        let mut pt_keys: Vec<_> = pt.keys().collect();
        let mut en_keys: Vec<_> = en.keys().collect();
        pt_keys.sort();
        en_keys.sort();
        assert_eq!(pt_keys, en_keys);
    }

    #[test]
    fn translate_replaces_placeholders() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate("en", "insufficient_stock", &[("available", "2.5".into())]);
        assert_eq!(msg, "Insufficient stock. Available: 2.5.");
    }

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("de", "invalid_credentials", &[]),
            "E-mail ou senha inválidos."
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("pt", "nao_existe", &[]), "nao_existe");
    }
}
