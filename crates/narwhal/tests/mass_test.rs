use narwhal::{
    Edge, ForceParams, Graph, HubThresholds, MassTier, MassTiers, Node, assign_masses,
    find_components,
};

#[test]
fn component_members_share_the_top_tier() {
    let nodes = vec![
        Node::state_holder("p1"),
        Node::activity("t1"),
        Node::state_holder("p2"),
        Node::activity("t2"),
        Node::activity("leaf"),
    ];
    let edges = vec![
        Edge::new("p1", "t1"),
        Edge::new("t1", "p2"),
        Edge::new("p2", "t2"),
        Edge::new("t2", "p1"),
        Edge::new("t2", "leaf"),
    ];
    let g = Graph::build(&nodes, &edges).unwrap();
    let comps = find_components(&g);
    let tiers = MassTiers::default();
    let masses = assign_masses(&g, &comps, &HubThresholds::default(), &tiers);

    for id in ["p1", "t1", "p2", "t2"] {
        assert_eq!(masses[id], tiers.scc, "{id}");
    }
    assert_eq!(masses["leaf"], tiers.base_activity);
}

#[test]
fn degree_selects_hub_tiers_and_isolated_nodes_use_kind() {
    let mut nodes = vec![
        Node::activity("hub"),
        Node::state_holder("mid"),
        Node::state_holder("lonely-place"),
        Node::activity("lonely-transition"),
    ];
    let mut edges = Vec::new();
    for i in 0..6 {
        let id = format!("s{i}");
        nodes.push(Node::state_holder(id.clone()));
        edges.push(Edge::new("hub", id));
    }
    for id in ["m0", "m1", "m2"] {
        nodes.push(Node::activity(id));
    }
    edges.push(Edge::new("mid", "m0"));
    edges.push(Edge::new("mid", "m1"));
    edges.push(Edge::new("m2", "mid"));

    let g = Graph::build(&nodes, &edges).unwrap();
    let comps = find_components(&g);
    assert!(comps.is_empty());

    let tiers = MassTiers::default();
    let masses = assign_masses(&g, &comps, &HubThresholds::default(), &tiers);
    assert_eq!(masses["hub"], tiers.super_hub);
    assert_eq!(masses["mid"], tiers.minor_hub);
    assert_eq!(masses["lonely-place"], tiers.base_state_holder);
    assert_eq!(masses["lonely-transition"], tiers.base_activity);
    assert_eq!(masses["s0"], tiers.base_state_holder);
    assert_eq!(masses["m0"], tiers.base_activity);
    // Input order is preserved.
    assert_eq!(masses.get_index(0).map(|(id, _)| id.as_str()), Some("hub"));
}

#[test]
fn parallel_edges_count_toward_degree() {
    let nodes = vec![Node::activity("a"), Node::state_holder("b")];
    let edges = vec![Edge::new("a", "b"), Edge::new("a", "b"), Edge::new("a", "b"), Edge::new("a", "b")];
    let g = Graph::build(&nodes, &edges).unwrap();
    let tiers = MassTiers::default();
    let masses = assign_masses(&g, &[], &HubThresholds::default(), &tiers);
    assert_eq!(masses["a"], tiers.major_hub);
}

#[test]
fn custom_tiers_and_thresholds_are_honored() {
    let nodes = vec![Node::activity("a"), Node::activity("b")];
    let edges = vec![Edge::new("a", "b")];
    let g = Graph::build(&nodes, &edges).unwrap();
    let hubs = HubThresholds {
        super_hub: 3,
        major_hub: 2,
        minor_hub: 1,
    };
    let tiers = MassTiers {
        minor_hub: 42.0,
        ..Default::default()
    };
    let masses = assign_masses(&g, &[], &hubs, &tiers);
    assert_eq!(masses["a"], 42.0);
    assert_eq!(masses["b"], 42.0);
}

#[test]
fn default_proximity_threshold_splits_heavy_and_light_tiers() {
    let tiers = MassTiers::default();
    let threshold = ForceParams::default().proximity_threshold;
    let heavy = [MassTier::Scc, MassTier::SuperHub, MassTier::MajorHub];
    let light = [
        MassTier::MinorHub,
        MassTier::BaseStateHolder,
        MassTier::BaseActivity,
    ];
    for tier in heavy {
        assert!(tier.mass(&tiers) > threshold, "{tier:?}");
    }
    for tier in light {
        assert!(tier.mass(&tiers) <= threshold, "{tier:?}");
    }
}
