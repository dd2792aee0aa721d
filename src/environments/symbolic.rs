use std::collections::BTreeSet;
use std::fmt;
use itertools::Itertools;
use serde::{Serialize, Deserialize};
use crate::utils::utils_errors::BlocksimError;
use crate::utils::utils_sampling::SeededSampler;

/// An object type, e.g. `block`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Type {
    name: String
}
impl Type {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Predicate {
    name: String,
    arity: usize,
    var_types: Vec<Type>
}
impl Predicate {
    pub fn new(name: &str, var_types: Vec<Type>) -> Self {
        Self {
            name: name.to_string(),
            arity: var_types.len(),
            var_types
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn arity(&self) -> usize {
        self.arity
    }
    pub fn var_types(&self) -> &Vec<Type> {
        &self.var_types
    }
    /// Applies the predicate to concrete object names.
    pub fn ground(&self, variables: &[&str]) -> Result<Literal, BlocksimError> {
        if variables.len() != self.arity {
            return Err(BlocksimError::new_generic_error_str(&format!("predicate {} takes {} arguments, got {}.", self.name, self.arity, variables.len()), file!(), line!()));
        }
        Ok(Literal {
            predicate: self.clone(),
            variables: variables.iter().map(|v| v.to_string()).collect()
        })
    }
}
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// A grounded predicate application such as `on(block1, block0)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    predicate: Predicate,
    variables: Vec<String>
}
impl Literal {
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
    pub fn variables(&self) -> &Vec<String> {
        &self.variables
    }
}
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.predicate.name, self.variables.join(", "))
    }
}

/// Sorted, deduplicated set of every argument occurring in `literals`.
pub fn objects_in_literals<'a, I: IntoIterator<Item = &'a Literal>>(literals: I) -> Vec<String> {
    let objects: BTreeSet<String> = literals.into_iter().flat_map(|l| l.variables.iter().cloned()).collect();
    objects.into_iter().collect()
}

/// The grounded action space: every action predicate applied to every tuple of currently known
/// objects.  The object domain is replaced wholesale by `update`, typically on every reset.
#[derive(Clone, Debug)]
pub struct LiteralSpace {
    predicates: Vec<Predicate>,
    objects: Vec<String>,
    sampler: SeededSampler
}
impl LiteralSpace {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            predicates,
            objects: vec![],
            sampler: SeededSampler::new(Some(0))
        }
    }
    pub fn predicates(&self) -> &Vec<Predicate> {
        &self.predicates
    }
    pub fn objects(&self) -> &Vec<String> {
        &self.objects
    }
    pub fn update(&mut self, objects: &[String]) {
        self.objects = objects.to_vec();
    }
    pub fn seed(&mut self, seed: Option<u64>) -> u64 {
        self.sampler.reseed(seed)
    }
    /// All ground literals, ordered by predicate then by argument tuple.
    pub fn all_ground_literals(&self) -> Vec<Literal> {
        let mut out_vec = vec![];
        for predicate in &self.predicates {
            if predicate.arity == 0 {
                out_vec.push(Literal { predicate: predicate.clone(), variables: vec![] });
                continue;
            }
            let tuples = (0..predicate.arity).map(|_| self.objects.iter().cloned()).multi_cartesian_product();
            for variables in tuples {
                out_vec.push(Literal { predicate: predicate.clone(), variables });
            }
        }
        out_vec
    }
    pub fn contains(&self, literal: &Literal) -> bool {
        self.predicates.contains(&literal.predicate) &&
            literal.variables.len() == literal.predicate.arity &&
            literal.variables.iter().all(|v| self.objects.contains(v))
    }
    /// Uniformly samples one ground literal; `None` if the space is empty.
    pub fn sample(&mut self) -> Option<Literal> {
        let all = self.all_ground_literals();
        let idx = self.sampler.choose_idx(all.len())?;
        all.into_iter().nth(idx)
    }
}

/// The observation space: sets of literals over a fixed collection of observation predicates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LiteralSetSpace {
    predicates: BTreeSet<Predicate>
}
impl LiteralSetSpace {
    pub fn new(predicates: BTreeSet<Predicate>) -> Self {
        Self { predicates }
    }
    pub fn predicates(&self) -> &BTreeSet<Predicate> {
        &self.predicates
    }
    pub fn contains(&self, literals: &BTreeSet<Literal>) -> bool {
        literals.iter().all(|l| self.predicates.contains(&l.predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Type { Type::new("block") }

    #[test]
    fn grounding_enumerates_all_object_tuples() {
        let pickup = Predicate::new("pickup", vec![block()]);
        let on = Predicate::new("on", vec![block(), block()]);
        let handempty = Predicate::new("handempty", vec![]);
        let mut space = LiteralSpace::new(vec![pickup.clone(), on, handempty]);
        space.update(&["block0".to_string(), "block1".to_string()]);

        let all = space.all_ground_literals();
        assert_eq!(all.len(), 2 + 4 + 1);
        assert_eq!(all[0].to_string(), "pickup(block0)");
        assert_eq!(all[3].to_string(), "on(block0, block1)");
        assert_eq!(all[6].to_string(), "handempty()");
        assert!(space.contains(&pickup.ground(&["block1"]).unwrap()));
        assert!(!space.contains(&pickup.ground(&["block7"]).unwrap()));
    }

    #[test]
    fn grounding_checks_arity() {
        let on = Predicate::new("on", vec![block(), block()]);
        assert!(on.ground(&["block0"]).is_err());
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let mut a = LiteralSpace::new(vec![Predicate::new("pickup", vec![block()])]);
        a.update(&(0..5).map(|i| format!("block{}", i)).collect::<Vec<_>>());
        let mut b = a.clone();
        a.seed(Some(3));
        b.seed(Some(3));
        for _ in 0..10 {
            assert_eq!(a.sample(), b.sample());
        }
        a.update(&[]);
        assert_eq!(a.sample(), None);
    }

    #[test]
    fn objects_are_sorted_and_deduplicated() {
        let ontable = Predicate::new("ontable", vec![block()]);
        let on = Predicate::new("on", vec![block(), block()]);
        let literals = vec![ontable.ground(&["block1"]).unwrap(), on.ground(&["block2", "block1"]).unwrap(), ontable.ground(&["block0"]).unwrap()];
        assert_eq!(objects_in_literals(&literals), vec!["block0", "block1", "block2"]);
    }
}
