use super::arc_chainer::chain_arcs;
use super::orientation::normalize_orientation;
use super::ring_splitter::detect_rings;
use crate::error::{MalformedRing, RejectReason, Rejection};
use crate::geometry::{Arc, Geometry, MemberArc, Polygon, Ring, RingSet, Role};
use crate::osm_parser::{
    ElementKind, ElementLookup, ElementRef, ProcessedMember, ProcessedRelation, ProcessedWay,
};
use crate::sink::GeometrySink;
use log::{debug, warn};
use std::fmt;

/// Steps a relation passes through on its way to a polygon.
///
/// `Validating` is the sink's construction check. A `Rejection` records the
/// step that failed; success has no stage of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStage {
    CollectingMembers,
    ChainingOuter,
    ChainingInner,
    SplittingRings,
    NormalizingOrientation,
    Validating,
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssemblyStage::CollectingMembers => "collecting members",
            AssemblyStage::ChainingOuter => "chaining outer arcs",
            AssemblyStage::ChainingInner => "chaining inner arcs",
            AssemblyStage::SplittingRings => "splitting rings",
            AssemblyStage::NormalizingOrientation => "normalizing orientation",
            AssemblyStage::Validating => "validating",
        };
        f.write_str(name)
    }
}

/// Resolved member arcs of one relation, partitioned by role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationMembers {
    pub outer: Vec<MemberArc>,
    pub inner: Vec<MemberArc>,
    /// Ring members whose geometry could not be resolved.
    pub skipped: usize,
}

impl RelationMembers {
    fn arcs(members: Vec<MemberArc>) -> Vec<Arc> {
        members.into_iter().map(|member| member.arc).collect()
    }
}

/// A ring set of one role that could not be closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingSetError {
    pub stage: AssemblyStage,
    pub source: MalformedRing,
}

fn member_arc<L>(member: &ProcessedMember, lookup: &L) -> Option<Arc>
where
    L: ElementLookup + ?Sized,
{
    let coords = match &member.geometry {
        Some(coords) => coords.clone(),
        None => {
            let way = lookup.way(member.ref_id)?;
            lookup.way_coordinates(way)?
        }
    };

    // A single point cannot join anything
    if coords.len() < 2 {
        return None;
    }
    Arc::new(coords)
}

/// Partitions way members into outer and inner arcs. Members of another type
/// or role are ignored; unresolvable ones are skipped with a warning.
pub fn collect_members<L>(relation: &ProcessedRelation, lookup: &L) -> RelationMembers
where
    L: ElementLookup + ?Sized,
{
    let mut members = RelationMembers::default();

    for member in &relation.members {
        if member.kind != ElementKind::Way {
            continue;
        }
        let Some(role) = Role::from_osm(&member.role) else {
            continue;
        };

        let Some(arc) = member_arc(member, lookup) else {
            warn!(
                "Relation {}: skipping unresolvable {role} member way {}",
                relation.id, member.ref_id
            );
            members.skipped += 1;
            continue;
        };

        let member_arc = MemberArc {
            way_id: member.ref_id,
            role,
            arc,
        };
        match role {
            Role::Outer => members.outer.push(member_arc),
            Role::Inner => members.inner.push(member_arc),
        }
    }

    members
}

/// Chains, splits and orients the arcs of one role. No arcs yield no rings.
pub fn assemble_ring_set(arcs: &[Arc], role: Role) -> Result<RingSet, RingSetError> {
    let chaining = match role {
        Role::Outer => AssemblyStage::ChainingOuter,
        Role::Inner => AssemblyStage::ChainingInner,
    };

    let chain = chain_arcs(arcs);
    if chain.is_stalled() {
        return Err(RingSetError {
            stage: chaining,
            source: MalformedRing::Stalled {
                unused: chain.unused,
            },
        });
    }

    let detected = detect_rings(&chain.points);
    if detected.dropped > 0 {
        return Err(RingSetError {
            stage: AssemblyStage::SplittingRings,
            source: MalformedRing::UnclosedTail {
                dropped: detected.dropped,
            },
        });
    }

    let mut rings = detected
        .rings
        .into_iter()
        .map(Ring::new)
        .collect::<Result<RingSet, _>>()
        .map_err(|source| RingSetError {
            stage: AssemblyStage::SplittingRings,
            source,
        })?;

    for ring in &mut rings {
        normalize_orientation(ring, role);
    }

    Ok(rings)
}

/// Builds the polygon of a relation. Outer failures reject the relation;
/// inner failures drop every hole and keep the outer rings.
pub fn assemble_relation<L, S>(
    relation: &ProcessedRelation,
    lookup: &L,
    sink: &S,
) -> Result<Geometry, Rejection>
where
    L: ElementLookup + ?Sized,
    S: GeometrySink + ?Sized,
{
    let element = ElementRef::new(ElementKind::Relation, relation.id);
    let reject = |stage, reason| Rejection::new(element, stage, reason);

    let members = collect_members(relation, lookup);
    debug!(
        "{element}: {} outer, {} inner, {} skipped members",
        members.outer.len(),
        members.inner.len(),
        members.skipped
    );
    if members.outer.is_empty() {
        return Err(reject(
            AssemblyStage::CollectingMembers,
            RejectReason::NoOuterMembers,
        ));
    }

    let outer_arcs = RelationMembers::arcs(members.outer);
    let outers = assemble_ring_set(&outer_arcs, Role::Outer).map_err(|e| {
        reject(
            e.stage,
            RejectReason::MalformedRing {
                role: Role::Outer,
                source: e.source,
            },
        )
    })?;

    let inner_arcs = RelationMembers::arcs(members.inner);
    let inners = match assemble_ring_set(&inner_arcs, Role::Inner) {
        Ok(rings) => rings,
        Err(e) => {
            warn!(
                "{element}: dropping holes, inner rings malformed while {}: {}",
                e.stage, e.source
            );
            RingSet::new()
        }
    };

    debug!(
        "{element}: {} outer and {} inner rings",
        outers.len(),
        inners.len()
    );
    let geometry = Geometry::Polygon(Polygon::new(outers, inners));
    sink.check_geometry(&geometry)
        .map_err(|e| reject(AssemblyStage::Validating, e.into()))?;

    Ok(geometry)
}

/// Builds the one-ring polygon of a closed way.
pub fn assemble_way_polygon<L, S>(
    way: &ProcessedWay,
    lookup: &L,
    sink: &S,
) -> Result<Geometry, Rejection>
where
    L: ElementLookup + ?Sized,
    S: GeometrySink + ?Sized,
{
    let element = ElementRef::new(ElementKind::Way, way.id);
    let reject = |stage, reason| Rejection::new(element, stage, reason);

    let coords = lookup
        .way_coordinates(way)
        .ok_or_else(|| reject(AssemblyStage::CollectingMembers, RejectReason::Unresolved))?;

    let mut ring = Ring::new(coords).map_err(|source| {
        reject(
            AssemblyStage::CollectingMembers,
            RejectReason::MalformedRing {
                role: Role::Outer,
                source,
            },
        )
    })?;
    if normalize_orientation(&mut ring, Role::Outer) {
        debug!("{element}: reversed outer ring");
    }

    let geometry = Geometry::Polygon(Polygon::new(vec![ring], RingSet::new()));
    sink.check_geometry(&geometry)
        .map_err(|e| reject(AssemblyStage::Validating, e.into()))?;

    Ok(geometry)
}
