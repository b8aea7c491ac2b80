use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/* --------- Estado compartido --------- */

/// Estado opaco definido por la aplicación que viaja entre el space y
/// todos los computers. El motor no mira dentro: solo lo fusiona (vía el
/// `StateMerger` de la aplicación) y lo reparte cuando cambió.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedState(pub Value);

impl SharedState {
    /// Estado vacío; el que tiene un space antes de su primer job.
    pub fn blank() -> Self {
        SharedState(Value::Null)
    }
}

impl fmt::Display for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "estado {}", self.0)
    }
}

/// Política de fusión suministrada por la aplicación.
///
/// Devuelve `Some(nuevo)` solo si la fusión cambió el estado; `None`
/// significa "me quedo como estaba" y corta la propagación. La fusión
/// tiene que ser lo bastante conmutativa e idempotente como para que la
/// aplicación repetida converja; el motor no impone nada más.
pub trait StateMerger: Send + Sync {
    fn merge(&self, current: &SharedState, proposed: &SharedState) -> Option<SharedState>;
}

/// Fusión nula: nunca cambia el estado local ni propaga nada.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlankMerger;

impl StateMerger for BlankMerger {
    fn merge(&self, _current: &SharedState, _proposed: &SharedState) -> Option<SharedState> {
        None
    }
}

/// Fusión por máximo numérico: útil para cotas monótonas compartidas,
/// por ejemplo la mejor solución conocida hasta el momento.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxMerger;

impl StateMerger for MaxMerger {
    fn merge(&self, current: &SharedState, proposed: &SharedState) -> Option<SharedState> {
        let cur = current.0.as_f64();
        let new = proposed.0.as_f64();
        match (cur, new) {
            (None, Some(_)) => Some(proposed.clone()),
            (Some(c), Some(n)) if n > c => Some(proposed.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_merger_never_reports_change() {
        let merger = BlankMerger;
        let current = SharedState::blank();
        assert!(merger.merge(&current, &SharedState(json!(7))).is_none());
    }

    #[test]
    fn max_merger_only_changes_on_strict_increase() {
        let merger = MaxMerger;
        let current = SharedState(json!(10));

        assert_eq!(merger.merge(&current, &SharedState(json!(12))), Some(SharedState(json!(12))));
        assert!(merger.merge(&current, &SharedState(json!(9))).is_none());

        // fusionar un estado consigo mismo no puede contar como cambio,
        // si contara habría una tormenta de propagación
        assert!(merger.merge(&current, &current.clone()).is_none());
    }
}
