//! Placeholder resolution: form fields + extracted fields -> token map.

use serde::Serialize;

use crate::extraction::ExtractedFields;
use crate::models::quotation::FormFields;

/// Token names, as written between `{{` and `}}` in the template.
pub mod tokens {
    pub const FECHA: &str = "fecha";
    pub const SERVICIO: &str = "servicio";
    pub const DIAS: &str = "dias";
    pub const OFERTA: &str = "oferta";
    pub const ARMADA: &str = "armada";
    pub const MES: &str = "MES";
    pub const DNI: &str = "dni";
    pub const NOMBRES: &str = "nombres";
    pub const RUC: &str = "ruc";
    pub const TELEFONO: &str = "telefono";
    pub const CORREO: &str = "correo";
    pub const DIRECCION: &str = "direccion";
    pub const BANCO: &str = "banco";
    pub const CUENTA: &str = "cuenta";
    pub const CCI: &str = "cci";
    pub const YEAR: &str = "year";

    /// Every text token, in substitution order.
    pub const ALL: [&str; 16] = [
        FECHA, SERVICIO, DIAS, OFERTA, ARMADA, MES, DNI, NOMBRES, RUC, TELEFONO, CORREO,
        DIRECCION, BANCO, CUENTA, CCI, YEAR,
    ];
}

/// Ordered token name -> value mapping consumed by the renderer.
///
/// Values are final text; the renderer does no formatting of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenMap {
    entries: Vec<(String, String)>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The literal placeholder for a token name.
    pub fn placeholder(name: &str) -> String {
        format!("{{{{{}}}}}", name)
    }

    /// Insert or overwrite a value. New names go last; overwritten names keep
    /// their position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Literal substring replacement of every placeholder, in insertion order.
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (name, value) in &self.entries {
            if !result.contains("{{") {
                break;
            }
            result = result.replace(&Self::placeholder(name), value);
        }
        result
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TokenMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TokenMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// Merge caller fields and extracted fields into one token map.
///
/// The two key sets are disjoint; nothing is validated.
pub fn resolve(form: &FormFields, extracted: &ExtractedFields) -> TokenMap {
    [
        (tokens::FECHA, form.fecha.as_str()),
        (tokens::SERVICIO, extracted.servicio.value.as_str()),
        (tokens::DIAS, extracted.dias.value.as_str()),
        (tokens::OFERTA, form.oferta.as_str()),
        (tokens::ARMADA, extracted.armada.value.as_str()),
        (tokens::MES, form.mes.as_str()),
        (tokens::DNI, form.dni.as_str()),
        (tokens::NOMBRES, form.nombres.as_str()),
        (tokens::RUC, form.ruc.as_str()),
        (tokens::TELEFONO, form.telefono.as_str()),
        (tokens::CORREO, form.correo.as_str()),
        (tokens::DIRECCION, form.direccion.as_str()),
        (tokens::BANCO, form.banco.as_str()),
        (tokens::CUENTA, form.cuenta.as_str()),
        (tokens::CCI, form.cci.as_str()),
        (tokens::YEAR, form.year.as_str()),
    ]
    .into_iter()
    .collect()
}
