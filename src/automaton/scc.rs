/// Computes the strongly connected components of a graph given by its successor lists.
///
/// Returns the component index of each node.
/// Components are numbered in the order they are completed (reverse topological order).
pub(crate) fn strongly_connected_components(successors: &[Vec<usize>]) -> Vec<usize> {
    let n = successors.len();
    let mut computer = SccComputer {
        index: vec![None; n],
        low_link: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::with_capacity(n),
        components: vec![usize::MAX; n],
        next_index: 0,
        n_components: 0,
    };
    for root in 0..n {
        if computer.index[root].is_none() {
            computer.explore_from(successors, root);
        }
    }
    computer.components
}

struct SccComputer {
    index: Vec<Option<usize>>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    components: Vec<usize>,
    next_index: usize,
    n_components: usize,
}

impl SccComputer {
    fn discover(&mut self, node: usize, call_stack: &mut Vec<(usize, usize)>) {
        self.index[node] = Some(self.next_index);
        self.low_link[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;
        call_stack.push((node, 0));
    }

    fn explore_from(&mut self, successors: &[Vec<usize>], root: usize) {
        let mut call_stack = vec![];
        self.discover(root, &mut call_stack);
        while let Some((node, next_child)) = call_stack.last_mut() {
            let node = *node;
            if let Some(&succ) = successors[node].get(*next_child) {
                *next_child += 1;
                match self.index[succ] {
                    None => self.discover(succ, &mut call_stack),
                    Some(succ_index) if self.on_stack[succ] => {
                        self.low_link[node] = usize::min(self.low_link[node], succ_index)
                    }
                    Some(_) => {}
                }
                continue;
            }
            call_stack.pop();
            if let Some(&(parent, _)) = call_stack.last() {
                self.low_link[parent] = usize::min(self.low_link[parent], self.low_link[node]);
            }
            if Some(self.low_link[node]) == self.index[node] {
                while let Some(member) = self.stack.pop() {
                    self.on_stack[member] = false;
                    self.components[member] = self.n_components;
                    if member == node {
                        break;
                    }
                }
                self.n_components += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain() {
        let components = strongly_connected_components(&[vec![1], vec![2], vec![]]);
        assert_ne!(components[0], components[1]);
        assert_ne!(components[1], components[2]);
        assert_ne!(components[0], components[2]);
    }

    #[test]
    fn test_cycle_and_tail() {
        let components = strongly_connected_components(&[vec![1], vec![2], vec![1, 3], vec![3]]);
        assert_eq!(components[1], components[2]);
        assert_ne!(components[0], components[1]);
        assert_ne!(components[3], components[1]);
        assert_ne!(components[3], components[0]);
    }

    #[test]
    fn test_two_cycles() {
        let components =
            strongly_connected_components(&[vec![1], vec![0, 2], vec![3], vec![2, 4], vec![]]);
        assert_eq!(components[0], components[1]);
        assert_eq!(components[2], components[3]);
        assert_ne!(components[0], components[2]);
        assert_ne!(components[4], components[2]);
    }

    #[test]
    fn test_empty() {
        assert!(strongly_connected_components(&[]).is_empty());
    }
}
