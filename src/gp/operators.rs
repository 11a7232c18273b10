//! Genetic operators over expression trees.
//!
//! Subtrees are addressed by index: the 1-based position of a
//! binary-operation node in pre-order (depth-first, left before right).
//! Leaves are never addressed.
//!
//! # Operators
//!
//! - [`locate_subtree`] / [`replace_subtree`]: index-based addressing
//! - [`mutate_in_place`] / [`mutate`]: swap one operator for a different one
//! - [`crossover`]: transplant a donor subtree into a copy of the recipient

use crate::error::{GpError, Result};
use crate::expr::{Node, Operator, Program};
use rand::Rng;

// ============================================================================
// Subtree addressing
// ============================================================================

fn check_index(tree: &Node, index: usize) -> Result<()> {
    let count = tree.binop_count();
    if index == 0 || index > count {
        return Err(GpError::IndexOutOfRange { index, count });
    }
    Ok(())
}

/// Returns the binary-operation node at pre-order position `index`.
///
/// # Errors
/// [`GpError::IndexOutOfRange`] unless `1 <= index <= tree.binop_count()`.
pub fn locate_subtree(tree: &Node, index: usize) -> Result<&Node> {
    check_index(tree, index)?;
    let count = tree.binop_count();
    tree.preorder()
        .filter(|node| !node.is_leaf())
        .nth(index - 1)
        .ok_or(GpError::IndexOutOfRange { index, count })
}

/// Mutable variant of [`locate_subtree`].
pub fn locate_subtree_mut(tree: &mut Node, index: usize) -> Result<&mut Node> {
    check_index(tree, index)?;
    let count = tree.binop_count();
    let mut seen = 0;
    nth_binop_mut(tree, index, &mut seen).ok_or(GpError::IndexOutOfRange { index, count })
}

fn nth_binop_mut<'a>(node: &'a mut Node, target: usize, seen: &mut usize) -> Option<&'a mut Node> {
    if node.is_leaf() {
        return None;
    }
    *seen += 1;
    if *seen == target {
        return Some(node);
    }
    match node {
        Node::BinaryOp { left, right, .. } => {
            if let Some(found) = nth_binop_mut(left, target, seen) {
                return Some(found);
            }
            nth_binop_mut(right, target, seen)
        }
        Node::Variable(_) => None,
    }
}

/// Replaces the subtree at `index` with `replacement` and returns the
/// displaced subtree.
///
/// The replacement may be of any size, including a single leaf.
pub fn replace_subtree(tree: &mut Node, index: usize, replacement: Node) -> Result<Node> {
    let slot = locate_subtree_mut(tree, index)?;
    Ok(std::mem::replace(slot, replacement))
}

// ============================================================================
// Mutation
// ============================================================================

/// What a mutation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    /// Position of the mutated assignment in the program.
    pub assignment: usize,
    /// Subtree index of the mutated node within that assignment.
    pub index: usize,
    pub from: Operator,
    pub to: Operator,
}

/// Replaces the operator of the node at `index` with a uniformly drawn
/// different operator. Returns `(old, new)`.
pub fn mutate_node_at<R: Rng>(
    tree: &mut Node,
    index: usize,
    rng: &mut R,
) -> Result<(Operator, Operator)> {
    match locate_subtree_mut(tree, index)? {
        Node::BinaryOp { op, .. } => {
            let from = *op;
            let to = from.random_other(rng);
            *op = to;
            Ok((from, to))
        }
        Node::Variable(name) => Err(GpError::InvalidState(format!(
            "subtree index {index} resolved to leaf `{name}`"
        ))),
    }
}

/// Mutates `program` in place: one assignment is drawn uniformly, then one
/// of its binary-operation nodes is drawn uniformly and gets a different
/// operator.
///
/// # Errors
/// [`GpError::InvalidState`] if the program is empty or the drawn
/// assignment has no binary-operation node.
pub fn mutate_in_place<R: Rng>(program: &mut Program, rng: &mut R) -> Result<Mutation> {
    if program.is_empty() {
        return Err(GpError::InvalidState("cannot mutate an empty program".into()));
    }
    let assignment = rng.random_range(0..program.len());
    let target = &mut program.assignments_mut()[assignment];
    let count = target.expr.binop_count();
    if count == 0 {
        return Err(GpError::InvalidState(format!(
            "cannot mutate `{}`: tree has no binary-operation nodes",
            target.output
        )));
    }
    let index = rng.random_range(1..=count);
    let (from, to) = mutate_node_at(&mut target.expr, index, rng)?;
    log::trace!("mutated {} node {index}: {from} -> {to}", target.output);
    Ok(Mutation {
        assignment,
        index,
        from,
        to,
    })
}

/// Consumes `program` and returns its mutated form.
///
/// Pass a clone to keep the original.
pub fn mutate<R: Rng>(mut program: Program, rng: &mut R) -> Result<Program> {
    mutate_in_place(&mut program, rng)?;
    Ok(program)
}

// ============================================================================
// Crossover
// ============================================================================

/// Where a crossover cuts both parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverPoint {
    /// Assignment position, shared by both parents.
    pub assignment: usize,
    /// Subtree index in the recipient that gets replaced.
    pub destination: usize,
    /// Subtree index in the donor that gets copied.
    pub source: usize,
}

/// Draws a crossover point: a shared assignment, then a destination and a
/// source subtree index uniformly within each parent's tree.
pub fn random_crossover_point<R: Rng>(
    recipient: &Program,
    donor: &Program,
    rng: &mut R,
) -> Result<CrossoverPoint> {
    check_compatible(recipient, donor)?;
    let assignment = rng.random_range(0..recipient.len());
    let dest_count = binop_count_at(recipient, assignment)?;
    let src_count = binop_count_at(donor, assignment)?;
    Ok(CrossoverPoint {
        assignment,
        destination: rng.random_range(1..=dest_count),
        source: rng.random_range(1..=src_count),
    })
}

/// Copies `recipient` and splices in a copy of the donor subtree at
/// `point`. The donor is only read.
pub fn crossover_at(recipient: &Program, donor: &Program, point: CrossoverPoint) -> Result<Program> {
    check_compatible(recipient, donor)?;
    if point.assignment >= recipient.len() {
        return Err(GpError::InvalidState(format!(
            "assignment {} out of range for a program with {} assignments",
            point.assignment,
            recipient.len()
        )));
    }
    let donated = locate_subtree(&donor.assignments()[point.assignment].expr, point.source)?.clone();
    let mut offspring = recipient.clone();
    replace_subtree(
        &mut offspring.assignments_mut()[point.assignment].expr,
        point.destination,
        donated,
    )?;
    Ok(offspring)
}

/// Produces one offspring from `recipient` with a subtree of `donor`.
///
/// # Errors
/// [`GpError::InvalidState`] if the parents differ in assignment count or
/// the chosen trees have no binary-operation node.
pub fn crossover<R: Rng>(recipient: &Program, donor: &Program, rng: &mut R) -> Result<Program> {
    let point = random_crossover_point(recipient, donor, rng)?;
    crossover_at(recipient, donor, point)
}

fn check_compatible(recipient: &Program, donor: &Program) -> Result<()> {
    if recipient.len() != donor.len() {
        return Err(GpError::InvalidState(format!(
            "parents differ in assignment count: {} vs {}",
            recipient.len(),
            donor.len()
        )));
    }
    if recipient.is_empty() {
        return Err(GpError::InvalidState("cannot cross over empty programs".into()));
    }
    Ok(())
}

fn binop_count_at(program: &Program, assignment: usize) -> Result<usize> {
    let target = &program.assignments()[assignment];
    match target.expr.binop_count() {
        0 => Err(GpError::InvalidState(format!(
            "`{}` has no binary-operation nodes",
            target.output
        ))),
        n => Ok(n),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{parse_program, Assignment};
    use crate::gp::generator::ProgramGenerator;
    use crate::random::create_rng;
    use proptest::prelude::*;

    /// (a1 * b1 + a2) * (b3 - a1), indices: 1 = root, 2 = `+`, 3 = inner `*`, 4 = `-`
    fn sample_tree() -> Node {
        Node::mul(
            Node::add(Node::mul(Node::var("a1"), Node::var("b1")), Node::var("a2")),
            Node::sub(Node::var("b3"), Node::var("a1")),
        )
    }

    fn program(source: &str) -> Program {
        parse_program(source).unwrap()
    }

    // ---- Locate ----

    #[test]
    fn test_locate_preorder() {
        let tree = sample_tree();
        assert_eq!(locate_subtree(&tree, 1).unwrap(), &tree);
        assert_eq!(locate_subtree(&tree, 2).unwrap().to_string(), "a1 * b1 + a2");
        assert_eq!(locate_subtree(&tree, 3).unwrap().to_string(), "a1 * b1");
        assert_eq!(locate_subtree(&tree, 4).unwrap().to_string(), "b3 - a1");
    }

    #[test]
    fn test_locate_out_of_range() {
        let tree = sample_tree();
        assert_eq!(
            locate_subtree(&tree, 0),
            Err(GpError::IndexOutOfRange { index: 0, count: 4 })
        );
        assert_eq!(
            locate_subtree(&tree, 5),
            Err(GpError::IndexOutOfRange { index: 5, count: 4 })
        );
        assert!(matches!(
            locate_subtree(&Node::var("a1"), 1),
            Err(GpError::IndexOutOfRange { index: 1, count: 0 })
        ));
    }

    #[test]
    fn test_locate_mut_agrees_with_locate() {
        let tree = sample_tree();
        for index in 1..=4 {
            let mut copy = tree.clone();
            let expected = locate_subtree(&tree, index).unwrap().clone();
            assert_eq!(locate_subtree_mut(&mut copy, index).unwrap(), &expected);
        }
    }

    // ---- Replace ----

    #[test]
    fn test_replace_inner_subtree() {
        let mut tree = sample_tree();
        let displaced = replace_subtree(&mut tree, 3, Node::var("b4")).unwrap();
        assert_eq!(displaced.to_string(), "a1 * b1");
        assert_eq!(tree.to_string(), "(b4 + a2) * (b3 - a1)");
        assert_eq!(tree.binop_count(), 3);
    }

    #[test]
    fn test_replace_root_with_larger_tree() {
        let mut tree = sample_tree();
        let bigger = Node::add(sample_tree(), sample_tree());
        let displaced = replace_subtree(&mut tree, 1, bigger.clone()).unwrap();
        assert_eq!(displaced, sample_tree());
        assert_eq!(tree, bigger);
        assert_eq!(tree.binop_count(), 9);
    }

    #[test]
    fn test_replace_out_of_range_leaves_tree_untouched() {
        let mut tree = sample_tree();
        assert!(replace_subtree(&mut tree, 7, Node::var("a1")).is_err());
        assert_eq!(tree, sample_tree());
    }

    // ---- Mutation ----

    #[test]
    fn test_mutate_changes_exactly_one_operator() {
        let mut rng = create_rng(42);
        let original = program(
            "fn f(a: i64, b: i64) -> [i64; 2] { let c1 = a + b * a; let c2 = a - b; [c1, c2] }",
        );
        for _ in 0..100 {
            let mut mutated = original.clone();
            let record = mutate_in_place(&mut mutated, &mut rng).unwrap();
            assert_ne!(record.from, record.to);

            let before = &original.assignments()[record.assignment].expr;
            let after = &mutated.assignments()[record.assignment].expr;
            assert_eq!(locate_subtree(before, record.index).unwrap().operator(), Some(record.from));
            assert_eq!(locate_subtree(after, record.index).unwrap().operator(), Some(record.to));

            let diffs = before
                .preorder()
                .zip(after.preorder())
                .filter(|(x, y)| x.operator() != y.operator())
                .count();
            assert_eq!(diffs, 1);
            assert_eq!(before.variables().collect::<Vec<_>>(), after.variables().collect::<Vec<_>>());

            for (i, (a, b)) in original.assignments().iter().zip(mutated.assignments()).enumerate() {
                if i != record.assignment {
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_mutate_single_add_never_stays_add() {
        let mut rng = create_rng(123_456_789);
        let original = program("fn f(a: i64, b: i64) -> [i64; 1] { let c = a + b; [c] }");
        let mut seen_sub = false;
        let mut seen_mul = false;
        for _ in 0..100 {
            let mutated = mutate(original.clone(), &mut rng).unwrap();
            match mutated.assignments()[0].expr.operator() {
                Some(Operator::Subtract) => seen_sub = true,
                Some(Operator::Multiply) => seen_mul = true,
                other => panic!("unexpected operator after mutation: {other:?}"),
            }
        }
        assert!(seen_sub && seen_mul);
    }

    #[test]
    fn test_mutate_bare_leaf_is_invalid_state() {
        let mut rng = create_rng(42);
        let mut leaf_only = Program::new(vec!["a".into()], vec![Assignment::new("c", Node::var("a"))]);
        assert!(matches!(
            mutate_in_place(&mut leaf_only, &mut rng),
            Err(GpError::InvalidState(_))
        ));
        let mut empty = Program::new(vec!["a".into()], vec![]);
        assert!(matches!(
            mutate_in_place(&mut empty, &mut rng),
            Err(GpError::InvalidState(_))
        ));
    }

    // ---- Crossover ----

    #[test]
    fn test_crossover_at_known_point() {
        let parent_1 = program(
            "fn f(a: i64, b: i64) -> [i64; 2] { let c1 = a - b; let c2 = a + b; [c1, c2] }",
        );
        let parent_2 = program(
            "fn f(a: i64, b: i64) -> [i64; 2] {
                let c1 = (a + b * a) * b + a * (b + a);
                let c2 = (a * b + a + b) * a + b * a;
                [c1, c2]
            }",
        );
        let point = CrossoverPoint {
            assignment: 1,
            destination: 1,
            source: 6,
        };
        let offspring = crossover_at(&parent_1, &parent_2, point).unwrap();
        let expected = program(
            "fn f(a: i64, b: i64) -> [i64; 2] { let c1 = a - b; let c2 = b * a; [c1, c2] }",
        );
        assert_eq!(offspring, expected);
        // parents untouched
        assert_eq!(parent_1.assignments()[1].expr.to_string(), "a + b");
        assert_eq!(parent_2.binop_count(), 12);
    }

    #[test]
    fn test_crossover_rejects_mismatched_parents() {
        let mut rng = create_rng(42);
        let one = program("fn f(a: i64) -> [i64; 1] { let c = a * a; [c] }");
        let two = program("fn f(a: i64) -> [i64; 2] { let c = a * a; let d = a + a; [c, d] }");
        assert!(matches!(
            crossover(&one, &two, &mut rng),
            Err(GpError::InvalidState(_))
        ));
    }

    #[test]
    fn test_crossover_rejects_leaf_tree() {
        let mut rng = create_rng(42);
        let leaf = Program::new(vec!["a".into()], vec![Assignment::new("c", Node::var("a"))]);
        let tree = program("fn f(a: i64) -> [i64; 1] { let c = a * a; [c] }");
        assert!(matches!(
            crossover(&leaf, &tree, &mut rng),
            Err(GpError::InvalidState(_))
        ));
        assert!(matches!(
            crossover(&tree, &leaf, &mut rng),
            Err(GpError::InvalidState(_))
        ));
    }

    #[test]
    fn test_crossover_point_bounds() {
        let mut rng = create_rng(5);
        let generator = ProgramGenerator::matmul_2x2();
        for _ in 0..200 {
            let a = generator.generate(6, &mut rng).unwrap();
            let b = generator.generate(6, &mut rng).unwrap();
            let point = random_crossover_point(&a, &b, &mut rng).unwrap();
            assert!(point.assignment < 4);
            let dest_max = a.assignments()[point.assignment].expr.binop_count();
            let src_max = b.assignments()[point.assignment].expr.binop_count();
            assert!((1..=dest_max).contains(&point.destination));
            assert!((1..=src_max).contains(&point.source));
        }
    }

    proptest! {
        #[test]
        fn prop_crossover_only_changes_spliced_subtree(seed in any::<u64>(), max in 2usize..9) {
            let mut rng = create_rng(seed);
            let generator = ProgramGenerator::matmul_2x2();
            let recipient = generator.generate(max, &mut rng).unwrap();
            let donor = generator.generate(max, &mut rng).unwrap();

            let point = random_crossover_point(&recipient, &donor, &mut rng).unwrap();
            let offspring = crossover_at(&recipient, &donor, point).unwrap();

            prop_assert_eq!(offspring.len(), recipient.len());
            for (i, (child, parent)) in offspring.assignments().iter().zip(recipient.assignments()).enumerate() {
                if i != point.assignment {
                    prop_assert_eq!(child, parent);
                }
            }

            let spliced = locate_subtree(&offspring.assignments()[point.assignment].expr, point.destination).unwrap();
            let donated = locate_subtree(&donor.assignments()[point.assignment].expr, point.source).unwrap();
            prop_assert_eq!(spliced, donated);

            // Putting the original subtree back restores the recipient.
            let original = locate_subtree(&recipient.assignments()[point.assignment].expr, point.destination)
                .unwrap()
                .clone();
            let mut restored = offspring.clone();
            replace_subtree(&mut restored.assignments_mut()[point.assignment].expr, point.destination, original)
                .unwrap();
            prop_assert_eq!(restored, recipient);
        }

        #[test]
        fn prop_mutation_never_keeps_operator(seed in any::<u64>(), max in 2usize..9) {
            let mut rng = create_rng(seed);
            let generator = ProgramGenerator::matmul_2x2();
            let original = generator.generate(max, &mut rng).unwrap();
            let mut mutated = original.clone();
            let record = mutate_in_place(&mut mutated, &mut rng).unwrap();
            let before = locate_subtree(&original.assignments()[record.assignment].expr, record.index).unwrap();
            let after = locate_subtree(&mutated.assignments()[record.assignment].expr, record.index).unwrap();
            prop_assert_ne!(before.operator(), after.operator());
            prop_assert_eq!(original.binop_count(), mutated.binop_count());
        }
    }
}
