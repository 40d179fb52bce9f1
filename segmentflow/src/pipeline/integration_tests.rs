//! End-to-end tests for composed pipelines.

#[cfg(test)]
mod tests {
    use crate::agents::{Agent, AgentStates};
    use crate::core::{Segment, SegmentType};
    use crate::errors::codes;
    use crate::pipeline::{LinearPipeline, Pipeline, TopologySpec, TreePipeline, TreePipelineBuilder};
    use crate::testing::{
        assert_empty, assert_finished, assert_text, assert_topology_error, fan_out_tree,
        mock_registry, speech_tree, CounterAgent, SuffixAgent, WaitKAgent,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn suffix(name: &str, suffix: &str) -> Arc<dyn Agent> {
        Arc::new(SuffixAgent::new(name, suffix))
    }

    fn texts(segments: &[Segment]) -> Vec<Option<&str>> {
        segments.iter().map(Segment::as_text).collect()
    }

    /// `r -> [m, l1]`, `m -> [l2, l3]`, declared so that the leaf order
    /// differs from the traversal order.
    fn deep_tree(output_index: Option<usize>) -> TreePipeline {
        let mut builder = TreePipelineBuilder::new("deep")
            .node("r", suffix("r", "r"), &["m", "l1"])
            .node("m", suffix("m", "m"), &["l2", "l3"])
            .node("l1", suffix("l1", "1"), &[])
            .node("l2", suffix("l2", "2"), &[])
            .node("l3", suffix("l3", "3"), &[]);
        if let Some(index) = output_index {
            builder = builder.output_index(index);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_linear_types_for_any_length() {
        for len in 1..=4_usize {
            let agents: Vec<Arc<dyn Agent>> = (0..len)
                .map(|i| {
                    Arc::new(SuffixAgent::new(format!("s{i}"), "").with_types(
                        SegmentType::new(format!("t{i}")),
                        SegmentType::new(format!("t{}", i + 1)),
                    )) as Arc<dyn Agent>
                })
                .collect();
            let pipeline = LinearPipeline::new("chain", agents).unwrap();

            assert_eq!(pipeline.source_type(), SegmentType::new("t0"));
            assert_eq!(pipeline.target_type(), SegmentType::new(format!("t{len}")));
        }
    }

    #[test]
    fn test_leaf_order_follows_declaration() {
        let tree = deep_tree(None);
        let mut states = tree.build_states();

        tree.push(Segment::text("x"), &mut states).unwrap();
        let outputs = tree.pop_all(&mut states).unwrap();
        assert_eq!(texts(&outputs), vec![Some("xr1"), Some("xrm2"), Some("xrm3")]);
    }

    #[test]
    fn test_pop_length_is_independent_of_history() {
        let tree = deep_tree(None);
        let mut states = tree.build_states();

        for pushes in [0, 1, 3] {
            for _ in 0..pushes {
                tree.push(Segment::text("x"), &mut states).unwrap();
            }
            let out = tree.pop(&mut states).unwrap();
            assert_eq!(out.as_composite().map(<[Segment]>::len), Some(3));
        }
    }

    #[test]
    fn test_output_index_equals_leaf_pop_for_every_leaf() {
        let reference = deep_tree(None);
        let mut reference_states = reference.build_states();
        reference.push(Segment::text("x"), &mut reference_states).unwrap();
        let expected = reference.pop_all(&mut reference_states).unwrap();

        for (index, leaf_output) in expected.iter().enumerate() {
            let tree = deep_tree(Some(index));
            let mut states = tree.build_states();
            tree.push(Segment::text("x"), &mut states).unwrap();
            assert_eq!(&tree.pop(&mut states).unwrap(), leaf_output);
        }
    }

    #[test]
    fn test_invalid_topologies_yield_no_pipeline() {
        let mismatch = LinearPipeline::new(
            "s2t",
            vec![
                Arc::new(SuffixAgent::new("a", "").with_types(SegmentType::TEXT, SegmentType::SPEECH)),
                suffix("b", ""),
            ],
        );
        assert_topology_error(mismatch, codes::TYPE_MISMATCH);

        let two_roots = TreePipelineBuilder::new("two-roots")
            .node("a", suffix("a", ""), &[])
            .node("b", suffix("b", ""), &[])
            .build();
        assert_topology_error(two_roots, codes::ROOT);

        let no_leaves = TreePipelineBuilder::new("no-leaves")
            .node("a", suffix("a", ""), &["b"])
            .node("b", suffix("b", ""), &["a"])
            .build();
        assert_topology_error(no_leaves, codes::NO_LEAF);
    }

    #[test]
    fn test_streaming_through_fan_out_until_finished() {
        let tree = TreePipelineBuilder::new("stream")
            .node("src", suffix("src", ""), &["wait", "echo"])
            .node("wait", Arc::new(WaitKAgent::new("wait", 2)), &[])
            .node("echo", suffix("echo", ""), &[])
            .build()
            .unwrap();
        let mut states = tree.build_states();

        tree.push(Segment::text("a"), &mut states).unwrap();
        let out = tree.pop_all(&mut states).unwrap();
        assert_empty(&out[0]);
        assert_text(&out[1], "a");

        tree.push(Segment::text("b"), &mut states).unwrap();
        assert_eq!(texts(&tree.pop_all(&mut states).unwrap()), vec![Some("a"), Some("b")]);

        tree.push(Segment::text("c").finished(), &mut states).unwrap();
        let out = tree.pop(&mut states).unwrap();
        assert!(!out.finished);
        let out = out.into_composite().unwrap();
        assert_text(&out[0], "b");
        assert_text(&out[1], "c");
        assert_finished(&out[1]);

        let out = tree.pop_all(&mut states).unwrap();
        assert_text(&out[0], "c");
        assert_finished(&out[0]);
        assert_empty(&out[1]);
    }

    #[test]
    fn test_speech_tree_branches() {
        let tree = speech_tree();
        let mut states = tree.build_states();

        tree.push(Segment::text("hallo"), &mut states).unwrap();
        let outputs = tree.pop_all(&mut states).unwrap();
        assert_eq!(texts(&outputs), vec![Some("hallo:mt"), Some("hallo:tts")]);
    }

    #[test]
    fn test_sessions_interleaved_on_one_thread() {
        let tree = Pipeline::from(fan_out_tree(Some(1)));
        let mut first = tree.build_states();
        let mut second = tree.build_states();

        tree.push(Segment::text("a"), &mut first).unwrap();
        tree.push(Segment::text("b"), &mut second).unwrap();
        tree.push(Segment::text("c"), &mut first).unwrap();

        assert_text(&tree.pop(&mut second).unwrap(), "b1c");
        assert_empty(&tree.pop(&mut second).unwrap());
        assert_text(&tree.pop(&mut first).unwrap(), "a1c");
        assert_text(&tree.pop(&mut first).unwrap(), "c1c");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sessions_isolated_across_threads() {
        let pipeline: Arc<dyn Agent> = Arc::new(
            LinearPipeline::new(
                "count",
                vec![suffix("tag", "!"), Arc::new(CounterAgent::new("count"))],
            )
            .unwrap(),
        );

        let handles: Vec<_> = (1..=8_usize)
            .map(|session| {
                let pipeline = Arc::clone(&pipeline);
                tokio::task::spawn_blocking(move || {
                    let mut states: AgentStates = pipeline.build_states();
                    for _ in 0..session * 10 {
                        pipeline.push(Segment::text("x"), &mut states).unwrap();
                    }
                    pipeline.pop(&mut states).unwrap()
                })
            })
            .collect();

        for (session, handle) in (1..=8_usize).zip(handles) {
            let out = handle.await.unwrap();
            assert_text(&out, &(session * 10).to_string());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tree_shared_between_tasks() {
        let tree = Arc::new(fan_out_tree(None));

        let left = {
            let tree = Arc::clone(&tree);
            tokio::task::spawn_blocking(move || {
                let mut states = tree.build_states();
                tree.push(Segment::text("left"), &mut states).unwrap();
                tree.pop_all(&mut states).unwrap()
            })
        };
        let right = {
            let tree = Arc::clone(&tree);
            tokio::task::spawn_blocking(move || {
                let mut states = tree.build_states();
                tree.push(Segment::text("right"), &mut states).unwrap();
                tree.pop_all(&mut states).unwrap()
            })
        };

        let (left, right) = (left.await.unwrap(), right.await.unwrap());
        assert_eq!(texts(&left), vec![Some("left1b"), Some("left1c")]);
        assert_eq!(texts(&right), vec![Some("right1b"), Some("right1c")]);
    }

    #[test]
    fn test_configured_tree_with_nested_linear_branch() {
        let spec = TopologySpec::from_json_str(
            r#"{
                "name": "nested",
                "topology": {"tree": [
                    {"id": "root", "agent": "suffix", "config": {"name": "root", "suffix": "r"}, "children": ["branch", "leaf"]},
                    {"id": "branch", "pipeline": {
                        "name": "branch",
                        "topology": {"linear": [
                            {"agent": "suffix", "config": {"name": "b1", "suffix": "1"}},
                            {"agent": "suffix", "config": {"name": "b2", "suffix": "2"}}
                        ]}
                    }},
                    {"id": "leaf", "agent": "counter"}
                ]}
            }"#,
        )
        .unwrap();

        let pipeline = spec.build(&mock_registry()).unwrap();
        let mut states = pipeline.build_states();
        pipeline.push(Segment::text("x"), &mut states).unwrap();
        pipeline.push(Segment::text("y"), &mut states).unwrap();

        let out = pipeline.pop(&mut states).unwrap().into_composite().unwrap();
        assert_eq!(texts(&out), vec![Some("xr12"), Some("2")]);
        assert!(pipeline.to_string().starts_with("nested(\n\troot: root -> [branch, leaf]"));
    }
}
