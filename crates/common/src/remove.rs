use glam::Vec2;
use std::rc::Rc;

/// Decides whether the entity it is attached to should retire, given the
/// entity's current position.
///
/// Near and far representations of the same entity hold the same controller
/// and ask it the same question, so the answer never depends on which
/// representation is live.
pub trait RemoveController {
    fn should_remove(&self, pos: Vec2) -> bool;
}

/// Controllers are shared between every entity spawned into a chunk layer.
pub type SharedRemover = Rc<dyn RemoveController>;

/// Never retires its owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRemove;

impl RemoveController for NeverRemove {
    fn should_remove(&self, _pos: Vec2) -> bool {
        false
    }
}

impl<F> RemoveController for F
where
    F: Fn(Vec2) -> bool,
{
    fn should_remove(&self, pos: Vec2) -> bool {
        self(pos)
    }
}

/// Evaluate an optional controller; no controller means keep.
pub fn should_remove(remover: Option<&SharedRemover>, pos: Vec2) -> bool {
    remover.is_some_and(|r| r.should_remove(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_remove_keeps_everything() {
        assert!(!NeverRemove.should_remove(Vec2::splat(1e9)));
    }

    #[test]
    fn closures_act_as_controllers() {
        let r: SharedRemover = Rc::new(|p: Vec2| p.x > 5.0);
        assert!(r.should_remove(Vec2::new(6.0, 0.0)));
        assert!(!r.should_remove(Vec2::new(4.0, 0.0)));
    }

    #[test]
    fn missing_controller_keeps() {
        assert!(!should_remove(None, Vec2::ZERO));
        let r: SharedRemover = Rc::new(|_: Vec2| true);
        assert!(should_remove(Some(&r), Vec2::ZERO));
    }
}
