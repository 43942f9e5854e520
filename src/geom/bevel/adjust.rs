//! Offset reconciliation.
//!
//! With loop slide, a boundary point on an unbeveled edge ties the right offset of one
//! beveled edge to the left offset of the next (through the sine ratio of the angles).
//! Following those ties from edge to edge gives chains and cycles; each is solved as a
//! small weighted least-squares problem that keeps widths even at both ends of every edge
//! while staying close to the requested offsets.

use crate::geom::poly_mesh::{EdgeId, PolyMesh};

use super::context::{BevVertId, BevelContext, BvId, EhId, small_ang_dot};

/// Weight of the "match the requested offset" rows against the "even width" rows.
const MATCH_SPEC_WEIGHT: f64 = 0.2;

/// Solve `min |A x - b|` through the normal equations. `None` when singular.
fn least_squares(a: &[Vec<f64>], b: &[f64], ncols: usize) -> Option<Vec<f64>> {
    let mut ata = vec![vec![0.0; ncols]; ncols];
    let mut atb = vec![0.0; ncols];
    for (row, &rhs) in a.iter().zip(b) {
        for i in 0..ncols {
            if row[i] == 0.0 {
                continue;
            }
            atb[i] += row[i] * rhs;
            for j in 0..ncols {
                ata[i][j] += row[i] * row[j];
            }
        }
    }

    // Gaussian elimination with partial pivoting.
    for col in 0..ncols {
        let pivot = (col..ncols).max_by(|&x, &y| ata[x][col].abs().total_cmp(&ata[y][col].abs()))?;
        if ata[pivot][col].abs() < 1e-12 {
            return None;
        }
        ata.swap(col, pivot);
        atb.swap(col, pivot);
        for r in col + 1..ncols {
            let factor = ata[r][col] / ata[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..ncols {
                ata[r][c] -= factor * ata[col][c];
            }
            atb[r] -= factor * atb[col];
        }
    }
    let mut x = vec![0.0; ncols];
    for r in (0..ncols).rev() {
        let mut sum = atb[r];
        for c in r + 1..ncols {
            sum -= ata[r][c] * x[c];
        }
        x[r] = sum / ata[r][r];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

impl BevelContext {
    /// Points of a chain or cycle in `adjchain` order.
    fn adjchain_points(&self, vstart: BvId) -> Vec<BvId> {
        let mut out = Vec::new();
        let mut v = Some(vstart);
        while let Some(cur) = v {
            out.push(cur);
            v = self.bound_verts[cur].adjchain;
            if v == Some(vstart) || out.len() > self.bound_verts.len() {
                break;
            }
        }
        out
    }

    /// Solve one chain or cycle and write the new offsets back.
    fn adjust_the_cycle_or_chain(&mut self, vstart: BvId, iscycle: bool) {
        let points = self.adjchain_points(vstart);
        let np = points.len();
        if np < 2 {
            return;
        }
        let nrows = if iscycle { 3 * np } else { 3 * np - 3 };
        let mut a = vec![vec![0.0; np]; nrows];
        let mut b = vec![0.0; nrows];
        let weight = MATCH_SPEC_WEIGHT;

        for (i, &v) in points.iter().enumerate() {
            let bnd = &self.bound_verts[v];
            if iscycle || i < np - 1 {
                let (Some(eright), Some(next)) = (bnd.efirst, bnd.adjchain) else {
                    return;
                };
                let Some(enextleft) = self.bound_verts[next].elast else {
                    return;
                };
                // Width at this end equals width at the other end of the edge.
                a[i][i] += 1.0;
                if iscycle {
                    let row = if i > 0 { i - 1 } else { np - 1 };
                    a[row][i] += -bnd.sinratio;
                } else if i > 0 {
                    a[i - 1][i] += -bnd.sinratio;
                }
                // Both offsets stay near their requested values.
                let row = if iscycle { np + 2 * i } else { np - 1 + 2 * i };
                a[row][i] += weight;
                b[row] += weight * self.edge_halves[eright].offset_r;
                let col = if i == np - 1 { 0 } else { i + 1 };
                a[row + 1][col] += weight * self.bound_verts[next].sinratio;
                b[row + 1] += weight * self.edge_halves[enextleft].offset_l;
            } else {
                a[i - 1][i] += -1.0;
            }
        }

        let Some(solution) = least_squares(&a, &b, np) else {
            log::debug!("bevel: singular offset adjustment over {np} points, keeping offsets");
            self.diagnostics
                .add_warning(format!("offset adjustment over {np} points was singular"));
            return;
        };

        for (i, &v) in points.iter().enumerate() {
            let val = solution[i];
            let (efirst, elast, sinratio) = {
                let bnd = &self.bound_verts[v];
                (bnd.efirst, bnd.elast, bnd.sinratio)
            };
            if iscycle || i < np - 1 {
                if let Some(eright) = efirst {
                    self.edge_halves[eright].offset_r = val;
                }
                if iscycle || v != vstart {
                    if let Some(eleft) = elast {
                        self.edge_halves[eleft].offset_l = sinratio * val;
                    }
                }
            } else if let Some(eleft) = elast {
                self.edge_halves[eleft].offset_l = val;
            }
        }
        if iscycle {
            self.diagnostics.adjusted_cycle_count += 1;
        } else {
            self.diagnostics.adjusted_chain_count += 1;
        }
    }

    /// Even out widths along loop-slide chains and cycles, then move all boundaries.
    pub(crate) fn adjust_offsets(&mut self, mesh: &PolyMesh) {
        let tagged: Vec<BevVertId> = (0..self.vert_tags.len())
            .filter(|&v| self.vert_tagged(v))
            .filter_map(|v| self.find_bevvert(v))
            .collect();

        for &bv in &tagged {
            for vanchor in self.boundary(bv) {
                if self.bound_verts[vanchor].visited || self.bound_verts[vanchor].eon.is_none() {
                    continue;
                }
                // Follow left to right: the left side of one edge pairs with the right side
                // of the next.
                let mut v = vanchor;
                let mut vchainstart = vanchor;
                let mut vchainend = vanchor;
                let mut iscycle = false;
                let mut chainlen = 1;
                while self.bound_verts[v].eon.is_some() && !self.bound_verts[v].visited && !iscycle {
                    self.bound_verts[v].visited = true;
                    let Some(efirst) = self.bound_verts[v].efirst else {
                        break;
                    };
                    let Some((enext, _)) = self.other_end_edge_half(mesh, efirst) else {
                        break;
                    };
                    let Some(vnext) = self.edge_halves[enext].leftv else {
                        break;
                    };
                    self.bound_verts[v].adjchain = Some(vnext);
                    vchainend = vnext;
                    chainlen += 1;
                    if self.bound_verts[vnext].visited {
                        if vnext != vchainstart {
                            break;
                        }
                        self.adjust_the_cycle_or_chain(vchainstart, true);
                        iscycle = true;
                    }
                    v = vnext;
                }
                if iscycle {
                    continue;
                }
                // Then right to left, moving the chain start back.
                self.bound_verts[v].adjchain = None;
                v = vchainstart;
                loop {
                    self.bound_verts[v].visited = true;
                    let Some(elast) = self.bound_verts[v].elast else {
                        break;
                    };
                    let Some((enext, _)) = self.other_end_edge_half(mesh, elast) else {
                        break;
                    };
                    let Some(vnext) = self.edge_halves[enext].rightv else {
                        break;
                    };
                    self.bound_verts[vnext].adjchain = Some(v);
                    chainlen += 1;
                    vchainstart = vnext;
                    v = vnext;
                    if self.bound_verts[v].visited || self.bound_verts[v].eon.is_none() {
                        break;
                    }
                }
                if chainlen >= 3
                    && self.bound_verts[vchainstart].eon.is_none()
                    && self.bound_verts[vchainend].eon.is_none()
                {
                    self.adjust_the_cycle_or_chain(vchainstart, false);
                }
            }
        }

        for &bv in &tagged {
            self.build_boundary(mesh, bv, false);
        }
    }

    // ------------------------------------------------------------------------
    // Custom profile orientation
    // ------------------------------------------------------------------------

    /// Next beveled edge half along a path. Crossing the edge (`toward_bv == false`) goes
    /// to its other end; crossing the vertex picks the clearly most parallel beveled edge.
    fn next_edgehalf_bev(&self, mesh: &PolyMesh, start: EhId, toward_bv: bool, bv: &mut BevVertId) -> Option<EhId> {
        if !toward_bv {
            let (other, bvo) = self.other_end_edge_half(mesh, start)?;
            *bv = bvo;
            return Some(other);
        }
        let selcount = self.bev_verts[*bv].selcount;
        if selcount == 1 {
            return None;
        }
        if selcount == 2 {
            let mut e = self.edge_halves[start].next;
            while !self.edge_halves[e].is_bev {
                e = self.edge_halves[e].next;
            }
            return Some(e);
        }

        let v = self.bev_verts[*bv].v;
        let vco = mesh.position(v);
        let into = |eh: EhId| {
            let other = mesh.edge_other_vert(self.edge_halves[eh].e, v);
            (vco - mesh.position(other)).normalize_or_zero().0
        };
        let dir_start = into(start);
        let mut best_dot = 0.0;
        let mut second_best_dot = 0.0;
        let mut next_edge = None;
        let mut e = self.edge_halves[start].next;
        while e != start {
            if self.edge_halves[e].is_bev {
                let new_dot = (-into(e)).dot(dir_start);
                if new_dot > best_dot {
                    second_best_dot = best_dot;
                    best_dot = new_dot;
                    next_edge = Some(e);
                } else if new_dot > second_best_dot {
                    second_best_dot = new_dot;
                }
            }
            e = self.edge_halves[e].next;
        }
        if next_edge.is_some() && (best_dot - second_best_dot).abs() <= small_ang_dot() {
            return None;
        }
        next_edge
    }

    /// Walk the chain of beveled edges through `e`, marking which side of every profile
    /// is its start so custom profiles do not flip along the chain.
    pub(crate) fn regularize_profile_orientation(&mut self, mesh: &PolyMesh, e: EdgeId) {
        let Some(start_bv) = self.find_bevvert(mesh.edges[e].v1) else {
            return;
        };
        let Some(start) = self.find_edge_half(start_bv, e) else {
            return;
        };
        if !self.edge_halves[start].is_bev || self.edge_halves[start].visited_rpo {
            return;
        }
        let (Some(leftv), Some(rightv)) = (self.edge_halves[start].leftv, self.edge_halves[start].rightv) else {
            return;
        };
        // Start from the higher side so the choice does not depend on element order.
        let right_highest = self.bnd_co(leftv).z < self.bnd_co(rightv).z;
        self.bound_verts[leftv].is_profile_start = right_highest;
        self.edge_halves[start].visited_rpo = true;

        for i in 0..2 {
            let mut bv = start_bv;
            let mut toward_bv = i == 0;
            let mut next = self.next_edgehalf_bev(mesh, start, toward_bv, &mut bv);
            while let Some(eh) = next {
                if self.edge_halves[eh].visited_rpo {
                    break;
                }
                let flag = if i == 0 { toward_bv ^ right_highest } else { !toward_bv ^ right_highest };
                if let Some(l) = self.edge_halves[eh].leftv {
                    self.bound_verts[l].is_profile_start = flag;
                }
                toward_bv = !toward_bv;
                self.edge_halves[eh].visited_rpo = true;
                next = self.next_edgehalf_bev(mesh, eh, toward_bv, &mut bv);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_square_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let b = vec![3.0, 5.0];
        let x = least_squares(&a, &b, 2).expect("regular system");
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn least_squares_fits_overdetermined_rows() {
        // x = 1 and x = 3 with equal weight: the best fit is 2.
        let a = vec![vec![1.0], vec![1.0]];
        let b = vec![1.0, 3.0];
        let x = least_squares(&a, &b, 1).expect("regular system");
        assert!((x[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn least_squares_reports_singular() {
        let a = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        let b = vec![1.0, 2.0];
        assert!(least_squares(&a, &b, 2).is_none());
    }
}
