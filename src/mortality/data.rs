//! Embedded mortality data
//!
//! CDC period life tables, United States, 2007 (National Vital Statistics
//! Reports). Combined, male, and female probability of dying during a given
//! year of age; ages 100-109 conservatively extrapolated from the age-99
//! rate. Arrays are preferred over collections here for lookup performance.

/// Combined-population annual death probabilities by age (CDC 2007)
pub const CDC_PERSON: [f64; 110] = [
    0.006761, 0.000460, 0.000286, 0.000218, 0.000176, 0.000164, 0.000151, 0.000140, 0.000124, 0.000105,
    0.000091, 0.000094, 0.000132, 0.000209, 0.000314, 0.000426, 0.000529, 0.000627, 0.000715, 0.000796,
    0.000881, 0.000963, 0.001017, 0.001034, 0.001023, 0.001003, 0.000990, 0.000983, 0.000988, 0.001005,
    0.001030, 0.001060, 0.001099, 0.001146, 0.001201, 0.001264, 0.001340, 0.001434, 0.001548, 0.001685,
    0.001836, 0.002000, 0.002188, 0.002400, 0.002629, 0.002864, 0.003107, 0.003369, 0.003661, 0.003984,
    0.004337, 0.004709, 0.005091, 0.005474, 0.005863, 0.006275, 0.006726, 0.007220, 0.007773, 0.008389,
    0.009081, 0.009839, 0.010657, 0.011534, 0.012491, 0.013600, 0.014722, 0.015959, 0.017288, 0.018755,
    0.020424, 0.022385, 0.024679, 0.027320, 0.030299, 0.033636, 0.037216, 0.041160, 0.045503, 0.050281,
    0.055531, 0.061293, 0.067611, 0.074528, 0.082091, 0.090346, 0.099341, 0.109125, 0.119744, 0.131244,
    0.143668, 0.157056, 0.171442, 0.186853, 0.203309, 0.220822, 0.239389, 0.258999, 0.279625, 0.301225,
    0.301225, 0.301225, 0.301225, 0.301225, 0.301225, 0.301225, 0.301225, 0.301225, 0.301225, 0.301225,
];

/// Male annual death probabilities by age (CDC 2007)
pub const CDC_MALE: [f64; 110] = [
    0.007390, 0.000490, 0.000316, 0.000242, 0.000201, 0.000182, 0.000170, 0.000156, 0.000134, 0.000107,
    0.000085, 0.000089, 0.000143, 0.000256, 0.000411, 0.000573, 0.000725, 0.000873, 0.001014, 0.001149,
    0.001292, 0.001427, 0.001512, 0.001529, 0.001497, 0.001448, 0.001409, 0.001382, 0.001376, 0.001390,
    0.001412, 0.001437, 0.001474, 0.001516, 0.001570, 0.001634, 0.001716, 0.001821, 0.001956, 0.002120,
    0.002303, 0.002505, 0.002735, 0.002992, 0.003270, 0.003556, 0.003855, 0.004187, 0.004570, 0.005001,
    0.005474, 0.005969, 0.006473, 0.006971, 0.007469, 0.007995, 0.008567, 0.009179, 0.009843, 0.010571,
    0.011378, 0.012264, 0.013227, 0.014275, 0.015434, 0.016771, 0.018156, 0.019682, 0.021327, 0.023144,
    0.025204, 0.027616, 0.030417, 0.033598, 0.037153, 0.041097, 0.045315, 0.049944, 0.055019, 0.060576,
    0.066655, 0.073296, 0.080542, 0.088435, 0.097021, 0.106343, 0.116446, 0.127371, 0.139160, 0.151850,
    0.165475, 0.180063, 0.195635, 0.212205, 0.229779, 0.248348, 0.267897, 0.288394, 0.309795, 0.332043,
    0.332043, 0.332043, 0.332043, 0.332043, 0.332043, 0.332043, 0.332043, 0.332043, 0.332043, 0.332043,
];

/// Female annual death probabilities by age (CDC 2007)
pub const CDC_FEMALE: [f64; 110] = [
    0.006103, 0.000430, 0.000255, 0.000193, 0.000149, 0.000145, 0.000132, 0.000122, 0.000112, 0.000103,
    0.000096, 0.000100, 0.000120, 0.000160, 0.000212, 0.000271, 0.000325, 0.000369, 0.000400, 0.000422,
    0.000443, 0.000467, 0.000488, 0.000504, 0.000518, 0.000532, 0.000548, 0.000565, 0.000583, 0.000605,
    0.000634, 0.000670, 0.000714, 0.000767, 0.000824, 0.000887, 0.000959, 0.001040, 0.001137, 0.001248,
    0.001367, 0.001495, 0.001644, 0.001812, 0.001994, 0.002182, 0.002373, 0.002569, 0.002775, 0.002995,
    0.003236, 0.003494, 0.003763, 0.004041, 0.004330, 0.004639, 0.004981, 0.005372, 0.005826, 0.006347,
    0.006942, 0.007595, 0.008293, 0.009029, 0.009826, 0.010753, 0.011692, 0.012722, 0.013830, 0.015062,
    0.016484, 0.018170, 0.020151, 0.022445, 0.025056, 0.028016, 0.031215, 0.034767, 0.038707, 0.043073,
    0.047907, 0.053254, 0.059160, 0.065676, 0.072854, 0.080749, 0.089416, 0.098914, 0.109300, 0.120630,
    0.132959, 0.146339, 0.160816, 0.176428, 0.193208, 0.211174, 0.230333, 0.250679, 0.272186, 0.294812,
    0.294812, 0.294812, 0.294812, 0.294812, 0.294812, 0.294812, 0.294812, 0.294812, 0.294812, 0.294812,
];

/// Table span used for the degenerate and Gompertz-Makeham tables
pub const SYNTHETIC_TABLE_AGES: usize = 120;
