//! Property test for the end-to-end determinism invariant:
//! any permutation of a fixed handler/binding set synthesizes to an equal
//! graph with an equal canonical digest.

use proptest::prelude::*;

use topograph_core::prelude::*;

fn specs() -> Vec<HandlerSpec> {
    vec![
        HandlerSpec::new("product-search", "product_search.handler", 30, 1024)
            .depends_on(ResourceDependency::Secret),
        HandlerSpec::new("product-management", "product_management.handler", 60, 512)
            .depends_on(ResourceDependency::Secret),
        HandlerSpec::new("manage-users", "manage_users.handler", 30, 512)
            .depends_on(ResourceDependency::Secret),
        HandlerSpec::new("dump-products", "dump.handler", 900, 2048)
            .depends_on(ResourceDependency::Bucket),
        HandlerSpec::new("heartbeat", "heartbeat.handler", 5, 128),
    ]
}

fn bindings() -> Vec<(SurfaceKind, RouteBinding)> {
    let path = |segments: &[&str]| RoutePath::parse(segments).unwrap();
    vec![
        (
            SurfaceKind::Production,
            RouteBinding::new(path(&["products"]), HttpMethod::Get, "product-search"),
        ),
        (
            SurfaceKind::Production,
            RouteBinding::new(path(&["products", "{id}"]), HttpMethod::Get, "product-management"),
        ),
        (
            SurfaceKind::Production,
            RouteBinding::new(path(&["users"]), HttpMethod::Post, "manage-users"),
        ),
        (
            SurfaceKind::Staging,
            RouteBinding::new(path(&["dumps"]), HttpMethod::Post, "dump-products"),
        ),
        (
            SurfaceKind::Staging,
            RouteBinding::new(path(&["health"]), HttpMethod::Get, "heartbeat"),
        ),
    ]
}

fn synthesize(
    spec_order: &[HandlerSpec],
    binding_order: &[(SurfaceKind, RouteBinding)],
) -> SynthReport {
    let profile = RegionProfile::new(
        Region::UsEast2,
        "dealsnow",
        "dealsnow/db-credentials",
        "dealsnow-data",
    );
    let mut synth = TopologySynthesizer::new(profile);
    for spec in spec_order {
        synth.register_handler(spec.clone()).unwrap();
    }
    for (surface, binding) in binding_order {
        synth.bind_route(*surface, binding.clone()).unwrap();
    }
    synth.synthesize().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn permutations_synthesize_equal_graphs(
        spec_order in Just(specs()).prop_shuffle(),
        binding_order in Just(bindings()).prop_shuffle(),
    ) {
        let reference = synthesize(&specs(), &bindings());
        let permuted = synthesize(&spec_order, &binding_order);

        prop_assert_eq!(&reference.graph, &permuted.graph);
        prop_assert_eq!(reference.digest_hex, permuted.digest_hex);
    }
}
