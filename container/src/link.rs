use crate::engine::{Engine, EngineError};

/// Bind decoded functions into `global`, in order.
///
/// Each function gets its static parent set before its name becomes
/// visible. A later function with an already bound name replaces the
/// earlier binding.
pub fn link<E: Engine>(
    engine: &mut E,
    global: &E::Scope,
    functions: Vec<(String, E::Function)>,
) -> Result<(), EngineError> {
    for (name, mut function) in functions {
        engine.set_static_parent(&mut function, global)?;
        let value = engine.function_value(&function);
        if engine.define_global(global, &name, value)? {
            log::warn!("image rebinds global `{name}`; the later definition wins");
        }
        log::debug!("linked function `{name}`");
    }
    Ok(())
}
