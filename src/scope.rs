use std::{
    collections::HashMap,
    cell::RefCell,
    rc::Rc,
};


/// One frame in the chain. Frames are shared by reference between every
/// closure created inside them and are never copied.
pub struct Scope<'a, V> {
    vars: RefCell<HashMap<&'a str, V>>,
    parent: Option<Rc<Scope<'a, V>>>,
}
impl<'a, V: Clone> Scope<'a, V> {
    pub fn root()->Rc<Self> {
        Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn child(self: &Rc<Self>)->Rc<Self> {
        Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
        })
    }

    pub fn declare(&self, name: &'a str, value: V) {
        self.vars.borrow_mut().insert(name, value);
    }

    pub fn lookup(&self, name: &str)->Option<V> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }

        match &self.parent {
            Some(parent)=>parent.lookup(name),
            None=>None,
        }
    }

    /// Every name reachable from this frame, for diagnostics.
    pub fn visible(&self)->Vec<String> {
        let mut names: Vec<String> = self.vars.borrow()
            .keys()
            .map(|name|name.to_string())
            .collect();
        if let Some(parent) = &self.parent {
            names.extend(parent.visible());
        }
        names.sort();
        names.dedup();

        names
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_through_to_the_parent() {
        let root = Scope::root();
        root.declare("a", 1);
        let child = root.child();
        child.declare("b", 2);

        assert_eq!(child.lookup("a"), Some(1));
        assert_eq!(child.lookup("b"), Some(2));
        assert_eq!(root.lookup("b"), None);
    }

    #[test]
    fn child_bindings_shadow_the_parent() {
        let root = Scope::root();
        root.declare("a", 1);
        let child = root.child();
        child.declare("a", 2);

        assert_eq!(child.lookup("a"), Some(2));
        assert_eq!(root.lookup("a"), Some(1));
    }

    #[test]
    fn visible_names_are_sorted_and_deduped() {
        let root = Scope::root();
        root.declare("b", 1);
        root.declare("a", 1);
        let child = root.child();
        child.declare("a", 2);

        assert_eq!(child.visible(), vec!["a".to_string(), "b".to_string()]);
    }
}
