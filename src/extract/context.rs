use std::collections::HashMap;

const PROPONENTE_KEY: &str = "proponente";

/// Running state for one document scan. Never shared between documents.
#[derive(Debug, Default)]
pub struct ExtractionContext {
    pub orgao: Option<String>,
    pub sigla: Option<String>,
    pub nome_lista: Option<String>,
    pub section_tipo: Option<&'static str>,
    pub needs_review: bool,
    pub extra: HashMap<String, String>,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_list(&mut self, sigla: Option<String>, nome_lista: Option<String>) {
        if sigla.is_some() {
            self.sigla = sigla;
        }
        if nome_lista.is_some() {
            self.nome_lista = nome_lista;
        }
        self.section_tipo = None;
        self.clear_proposing_party();
    }

    pub fn set_orgao(&mut self, orgao: &str) {
        if self.orgao.as_deref() != Some(orgao) {
            self.section_tipo = None;
        }
        self.orgao = Some(orgao.to_string());
    }

    pub fn proposing_party(&self) -> Option<&str> {
        self.extra.get(PROPONENTE_KEY).map(String::as_str)
    }

    pub fn remember_proposing_party(&mut self, sigla: String) {
        self.extra.insert(PROPONENTE_KEY.to_string(), sigla);
    }

    pub fn clear_proposing_party(&mut self) {
        self.extra.remove(PROPONENTE_KEY);
    }

    /// Non-empty values from an emitted row become the new sticky context.
    pub fn reinforce(&mut self, sigla: &str, nome_lista: &str) {
        if !sigla.is_empty() {
            self.sigla = Some(sigla.to_string());
        }
        if !nome_lista.is_empty() {
            self.nome_lista = Some(nome_lista.to_string());
        }
    }
}
