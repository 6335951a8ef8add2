//! Dependency Graph - 플러그인 의존성 그래프
//!
//! 인접 리스트와 Kahn 알고리즘(반복형 위상 정렬)으로 의존성 순서를 계산합니다.
//! 위상 순서가 존재하지 않으면 순환 의존성입니다.

use std::collections::{HashMap, HashSet, VecDeque};

/// 의존성 그래프 (노드 → 의존 대상)
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// 삽입 순서 유지
    nodes: Vec<String>,
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 노드 추가 (이미 있으면 의존성 교체)
    pub fn add_node(&mut self, name: impl Into<String>, dependencies: &[String]) {
        let name = name.into();
        if !self.edges.contains_key(&name) {
            self.nodes.push(name.clone());
        }
        self.edges.insert(name, dependencies.to_vec());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn dependencies(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// name에 직접 의존하는 노드 (삽입 순)
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| self.dependencies(node).iter().any(|d| d == name))
            .map(String::as_str)
            .collect()
    }

    /// 그래프에 없는 의존 대상 (노드, 의존 대상)
    pub fn missing_dependencies(&self) -> Vec<(&str, &str)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                self.dependencies(node)
                    .iter()
                    .filter(|dep| !self.contains(dep))
                    .map(move |dep| (node.as_str(), dep.as_str()))
            })
            .collect()
    }

    /// 의존 대상이 먼저 오는 위상 순서
    ///
    /// 순환이 있으면 순환 경로(시작 노드가 끝에 반복됨)를 `Err`로 반환합니다.
    /// 그래프에 없는 의존 대상은 무시합니다.
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<String>> {
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(self.nodes.len());
        let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();

        for node in &self.nodes {
            let deps: HashSet<&str> = self
                .dependencies(node)
                .iter()
                .filter(|d| self.contains(d))
                .map(String::as_str)
                .collect();
            in_degree.insert(node.as_str(), deps.len());
            for dep in deps {
                reverse.entry(dep).or_default().push(node.as_str());
            }
        }

        let mut queue: VecDeque<&str> = self
            .nodes
            .iter()
            .map(String::as_str)
            .filter(|n| in_degree.get(n) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            order.push(node.to_string());
            // 결정적 순서를 위해 삽입 순으로 처리
            let mut ready = Vec::new();
            for dependent in reverse.get(node).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(*dependent);
                    }
                }
            }
            ready.sort_by_key(|n| index.get(n).copied().unwrap_or(usize::MAX));
            queue.extend(ready);
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }

        let remaining: HashSet<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(node, _)| *node)
            .collect();
        Err(self.trace_cycle(&remaining))
    }

    /// root와 그 전이적 의존 대상을 위상 순서로 반환
    pub fn closure_order(&self, root: &str) -> Result<Vec<String>, Vec<String>> {
        let mut included: HashSet<&str> = HashSet::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !self.contains(node) || !included.insert(node) {
                continue;
            }
            stack.extend(self.dependencies(node).iter().map(String::as_str));
        }

        let mut sub = DependencyGraph::new();
        for node in self.nodes.iter().filter(|n| included.contains(n.as_str())) {
            sub.add_node(node.clone(), self.dependencies(node));
        }
        sub.topological_order()
    }

    /// 남은 노드에서 순환 경로 하나를 찾음
    fn trace_cycle(&self, remaining: &HashSet<&str>) -> Vec<String> {
        let Some(start) = self
            .nodes
            .iter()
            .map(String::as_str)
            .find(|n| remaining.contains(n))
        else {
            return Vec::new();
        };

        let mut path: Vec<&str> = Vec::new();
        let mut current = start;
        loop {
            if let Some(pos) = path.iter().position(|n| *n == current) {
                let mut cycle: Vec<String> = path[pos..].iter().map(|n| n.to_string()).collect();
                cycle.push(current.to_string());
                return cycle;
            }
            path.push(current);

            // 남은 노드는 모두 남은 노드에 의존함
            match self
                .dependencies(current)
                .iter()
                .map(String::as_str)
                .find(|d| remaining.contains(d))
            {
                Some(next) => current = next,
                None => return path.into_iter().map(String::from).collect(),
            }
        }
    }
}
