use std::f32::consts::TAU;

use nalgebra::{Unit, Vector3};
use rand::Rng;

// 구면 위에서 균등하게 뽑음. z를 균등하게 뽑으면 면적도 균등함 (아르키메데스)
pub fn random_unit_vector<G: Rng + ?Sized>(rng: &mut G) -> Unit<Vector3<f32>> {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let phi: f32 = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();

    Unit::new_unchecked(Vector3::new(r * phi.cos(), r * phi.sin(), z))
}

// normal + 단위구 위의 점 => 코사인 가중 반구 샘플
pub fn cosine_hemisphere<G: Rng + ?Sized>(
    rng: &mut G,
    normal: &Unit<Vector3<f32>>,
) -> Unit<Vector3<f32>> {
    let candidate = normal.into_inner() + random_unit_vector(rng).into_inner();

    // 정반대 방향이 뽑히면 길이가 0이 되므로 그냥 normal 사용
    Unit::try_new(candidate, 1e-6).unwrap_or(*normal)
}

// glm::reflect와 같음
pub fn reflect(direction: &Unit<Vector3<f32>>, normal: &Unit<Vector3<f32>>) -> Vector3<f32> {
    let d: &Vector3<f32> = direction.as_ref();
    let n: &Vector3<f32> = normal.as_ref();
    d - n * (2.0 * d.dot(n))
}

pub fn lerp(from: &Vector3<f32>, to: &Vector3<f32>, t: f32) -> Vector3<f32> {
    from + (to - from) * t
}
